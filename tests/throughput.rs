use std::time::{Duration, Instant};

use squaremat::simd::backend_name;
use squaremat::{SquareMatrix, Strategy};

const N: usize = 512;

fn best_of<F: FnMut()>(runs: usize, mut f: F) -> Duration {
    (0..runs)
        .map(|_| {
            let start = Instant::now();
            f();
            start.elapsed()
        })
        .min()
        .unwrap_or_default()
}

#[test]
#[cfg_attr(debug_assertions, ignore = "timing only holds with optimizations")]
fn test_vector_tiles_beat_scalar_tiles() {
    if backend_name() == "portable" {
        return;
    }

    let a = SquareMatrix::<i32, N>::make_random(-100, 100).unwrap();
    let b = SquareMatrix::<i32, N>::make_random(-100, 100).unwrap();
    let mut out = SquareMatrix::<i32, N>::new();

    let scalar = best_of(3, || a.multiply(&b, &mut out, Strategy::Tiled).unwrap());
    for strategy in [
        Strategy::TiledVectorized,
        Strategy::TiledPrefetch,
        Strategy::TiledRegisterBlocked,
    ] {
        let vector = best_of(3, || a.multiply(&b, &mut out, strategy).unwrap());
        assert!(
            vector < scalar,
            "{strategy} took {vector:?}, {} took {scalar:?} on {}",
            Strategy::Tiled,
            backend_name()
        );
    }
}
