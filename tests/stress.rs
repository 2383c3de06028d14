use fibvec::{FibVec, MAX_VALUE, MIN_VALUE};
use rand::Rng;

#[test]
fn stress_one_hundred_thousand_random_values() {
    let mut rng = rand::thread_rng();
    let mut v = FibVec::new();
    let mut expected = Vec::with_capacity(100_000);

    for _ in 0..100_000 {
        let x: i64 = rng.gen_range(MIN_VALUE..=MAX_VALUE);
        v.add(x).unwrap();
        expected.push(x);
    }

    assert_eq!(v.len(), expected.len());
    let all = v.get_values(0, v.len()).unwrap();
    assert_eq!(all, expected);

    // Spot-check random access out of order too, not just a single bulk pass.
    for _ in 0..1000 {
        let i = rng.gen_range(0..expected.len());
        assert_eq!(v.get(i).unwrap(), expected[i]);
    }
}

#[test]
fn boundary_crossing_codeword_decodes_correctly() {
    // Drive the buffer length right up against a 64-bit word boundary with
    // small, cheap codewords, then append a large value whose codeword is
    // long enough to straddle a word boundary.
    let mut v = FibVec::new();
    for _ in 0..5 {
        v.add(0).unwrap();
    }
    v.add(MAX_VALUE).unwrap();
    for x in -3..3i64 {
        v.add(x).unwrap();
    }
    let expected: Vec<i64> = [0, 0, 0, 0, 0, MAX_VALUE, -3, -2, -1, 0, 1, 2].to_vec();
    let got = v.get_values(0, v.len()).unwrap();
    assert_eq!(got, expected);
}
