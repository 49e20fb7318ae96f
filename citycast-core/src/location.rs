use async_trait::async_trait;

use crate::{error::LocationError, model::Coordinates};

/// Single-shot position source.
#[async_trait]
pub trait Geolocator: Send + Sync + std::fmt::Debug {
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Reports a fixed position, or [`LocationError::Unsupported`] when none is
/// configured.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredLocation {
    position: Option<Coordinates>,
}

impl ConfiguredLocation {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }

    pub fn unsupported() -> Self {
        Self { position: None }
    }
}

#[async_trait]
impl Geolocator for ConfiguredLocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        let position = self.position.ok_or(LocationError::Unsupported)?;

        if !(-90.0..=90.0).contains(&position.latitude)
            || !(-180.0..=180.0).contains(&position.longitude)
        {
            return Err(LocationError::Unavailable(format!(
                "coordinates out of range: {}, {}",
                position.latitude, position.longitude
            )));
        }

        Ok(position)
    }
}
