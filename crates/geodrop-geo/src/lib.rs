/*!
# GeoDrop Geo Utilities

Coordinate validation and great-circle distance used by the claim gate.

```rust
use geodrop_geo::{haversine_distance, Coordinates, GeoResult};

fn example() -> GeoResult<()> {
    let drop = Coordinates::new(41.0082, 28.9784)?;
    let claimant = drop.offset(90.0, 25.0);

    assert!(haversine_distance(&drop, &claimant) < 50.0);
    Ok(())
}
```
*/

pub mod coordinates;
pub mod distance;
pub mod errors;

pub use coordinates::Coordinates;
pub use distance::{haversine_distance, EARTH_RADIUS_METERS};
pub use errors::{GeoError, GeoResult};
