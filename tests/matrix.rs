use rand::rngs::StdRng;
use rand::SeedableRng;
use squaremat::{Dim, MatmulError, SquareMatrix, Strategy};

const LITERAL: [i32; 16] = [
    1, 2, 3, 4, //
    5, 6, 7, 8, //
    9, 10, 11, 12, //
    13, 14, 15, 16,
];

#[test]
fn test_literal_round_trip() {
    let m = SquareMatrix::<i32, 4>::from_slice(&LITERAL).unwrap();

    assert_eq!(m.get(0, 0), 1);
    assert_eq!(m.get(1, 0), 2);
    assert_eq!(m.get(3, 1), 8);
    assert_eq!(m.get(1, 2), 10);
    assert_eq!(m.get(3, 3), 16);
    assert_eq!(m[(2, 3)], 15);
}

#[test]
fn test_literal_wrong_length() {
    let err = SquareMatrix::<i32, 4>::from_slice(&LITERAL[..15]).unwrap_err();
    assert_eq!(
        err,
        MatmulError::DimensionMismatch {
            expected: 16,
            actual: 15
        }
    );
}

#[test]
fn test_literal_shadow_is_transpose() {
    let m = SquareMatrix::<i32, 4>::from_slice(&LITERAL).unwrap();
    let t = m.data_transposed();

    assert!(m.has_fresh_transpose());
    for y in 0..4 {
        for x in 0..4 {
            assert_eq!(t[Dim::<4>::index(x, y)], m.get(y, x));
        }
    }
}

#[test]
fn test_transpose_is_involution() {
    let mut rng = StdRng::seed_from_u64(7);
    let m = SquareMatrix::<i32, 36>::make_random_with(&mut rng, -50, 50).unwrap();

    let t = m.transpose().unwrap();
    assert_eq!(t.get(3, 17), m.get(17, 3));
    assert_eq!(t.transpose().unwrap(), m);
}

#[test]
fn test_compute_transpose_refreshes_output() {
    let a = SquareMatrix::<i32, 8>::from_fn(|x, y| (x * 3 + y) as i32);
    let mut out = SquareMatrix::<i32, 8>::new();
    a.multiply(&a, &mut out, Strategy::Naive).unwrap();
    assert!(!out.has_fresh_transpose());

    out.compute_transpose();
    assert!(out.has_fresh_transpose());
    for y in 0..8 {
        for x in 0..8 {
            assert_eq!(out.data_transposed()[Dim::<8>::index(x, y)], out.get(y, x));
        }
    }
}

#[test]
fn test_equality_properties() {
    let mut rng = StdRng::seed_from_u64(11);
    let a = SquareMatrix::<i32, 12>::make_random_with(&mut rng, 0, 9).unwrap();
    let b = SquareMatrix::<i32, 12>::from_fn(|x, y| a.get(x, y));
    let values: Vec<i32> = b.rows().flatten().copied().collect();
    let c = SquareMatrix::<i32, 12>::from_slice(&values).unwrap();

    // Reflexive, symmetric, transitive.
    assert_eq!(a, a);
    assert_eq!(a, b);
    assert_eq!(b, a);
    assert_eq!(b, c);
    assert_eq!(a, c);

    let d = SquareMatrix::<i32, 12>::from_fn(|x, y| a.get(x, y) + i32::from(x == 11 && y == 11));
    assert_ne!(a, d);
}

#[test]
fn test_equality_ignores_shadow_state() {
    let a = SquareMatrix::<i32, 4>::from_slice(&LITERAL).unwrap();
    let identity = SquareMatrix::<i32, 4>::from_fn(|x, y| i32::from(x == y));
    let mut product = SquareMatrix::<i32, 4>::new();
    a.multiply(&identity, &mut product, Strategy::Tiled).unwrap();

    assert!(!product.has_fresh_transpose());
    assert_eq!(product, a);
}

#[test]
fn test_random_bounds() {
    let m = SquareMatrix::<u8, 16>::make_random(3, 5).unwrap();
    assert!(m.rows().flatten().all(|v| (3..=5).contains(v)));

    let single = SquareMatrix::<i64, 4>::make_random(-2, -2).unwrap();
    assert!(single.rows().flatten().all(|&v| v == -2));
}

#[test]
fn test_inverted_bounds_rejected() {
    let err = SquareMatrix::<i32, 8>::make_random(9, 0).unwrap_err();
    assert_eq!(
        err,
        MatmulError::InvalidBounds {
            lower: "9".to_string(),
            upper: "0".to_string()
        }
    );
}

#[test]
fn test_display_grid() {
    let m = SquareMatrix::<i32, 4>::from_slice(&LITERAL).unwrap();
    let text = m.to_string();
    let lines: Vec<_> = text.lines().collect();

    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "    1     2     3     4 ");
    assert_eq!(lines[3], "   13    14    15    16 ");
}

#[test]
#[should_panic(expected = "out of range")]
fn test_get_outside_logical_region() {
    let m = SquareMatrix::<i32, 4>::new();
    // Inside the padded buffer, outside the matrix.
    m.get(4, 0);
}

#[test]
fn test_default_is_zero() {
    let m: SquareMatrix<'_, i16, 8> = SquareMatrix::default();
    assert_eq!(m, SquareMatrix::<i16, 8>::from_fn(|_, _| 0));
    assert_eq!(m.data().len(), Dim::<8>::LEN);
}
