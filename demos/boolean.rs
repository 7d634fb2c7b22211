//! Runs the three boolean operations on two overlapping cubes and prints
//! the resulting mesh statistics.
//!
//! Usage:
//! ```text
//! cargo run --example boolean
//! RUST_LOG=boolis=debug cargo run --example boolean
//! ```

use boolis::math::Point3;
use boolis::mesh::TriangleMesh;
use boolis::operations::{BooleanOperation, BooleanOptions};
use boolis::Result;

fn cube(min: Point3, size: f64) -> TriangleMesh {
    let (x, y, z, s) = (min.x, min.y, min.z, size);
    let p = Point3::new;
    TriangleMesh::new(
        vec![
            p(x, y, z),
            p(x + s, y, z),
            p(x + s, y + s, z),
            p(x, y + s, z),
            p(x, y, z + s),
            p(x + s, y, z + s),
            p(x + s, y + s, z + s),
            p(x, y + s, z + s),
        ],
        vec![
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [1, 2, 6],
            [1, 6, 5],
            [2, 3, 7],
            [2, 7, 6],
            [3, 0, 4],
            [3, 4, 7],
        ],
    )
}

fn main() -> Result<()> {
    // Default: INFO for boolis. Override with RUST_LOG
    // (e.g. RUST_LOG=boolis=debug).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("boolis=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let a = cube(Point3::new(0.0, 0.0, 0.0), 1.0);
    let b = cube(Point3::new(0.5, 0.5, 0.5), 1.0);

    let options = BooleanOptions {
        progress: Some(Box::new(|stage, fraction| {
            tracing::debug!(%stage, fraction, "progress");
        })),
        ..BooleanOptions::default()
    };
    let op = BooleanOperation::with_options(&a, &b, options)?;

    for (name, mesh) in [
        ("union", op.union()?),
        ("intersection", op.intersection()?),
        ("difference", op.difference()?),
    ] {
        println!(
            "{name:>12}: {} triangles, volume {:.6}, closed: {}",
            mesh.triangle_count(),
            mesh.volume(),
            mesh.is_closed()
        );
    }
    Ok(())
}
