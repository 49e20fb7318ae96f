use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Shared "service unavailable" flag.
///
/// Sticky: once raised it stays raised until a successful read lowers it.
/// While raised, city search is disabled and suggestion cycles short-circuit.
#[derive(Debug, Clone, Default)]
pub struct ServiceStatus {
    unavailable: Arc<AtomicBool>,
}

impl ServiceStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unavailable(&self) -> bool {
        self.unavailable.load(Ordering::Acquire)
    }

    pub fn mark_unavailable(&self) {
        if !self.unavailable.swap(true, Ordering::AcqRel) {
            tracing::warn!("Weather service marked unavailable");
        }
    }

    pub fn mark_available(&self) {
        if self.unavailable.swap(false, Ordering::AcqRel) {
            tracing::info!("Weather service available again");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_is_shared_between_clones() {
        let status = ServiceStatus::new();
        let view = status.clone();
        assert!(!view.is_unavailable());

        status.mark_unavailable();
        assert!(view.is_unavailable());

        view.mark_available();
        assert!(!status.is_unavailable());
    }
}
