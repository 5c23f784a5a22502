//! Headless scene backend and counter display that write to the log.

use std::collections::BTreeMap;

use rescue_shared::{
    error::PlacementError,
    scene::{CounterDisplay, Counters, Handle, Pose, PrefabKind, SceneBackend},
};
use tracing::{debug, info};

/// Places nothing on screen; logs every call and tracks live instances.
#[derive(Debug, Default)]
pub struct TracingBackend {
    next: u64,
    live: BTreeMap<Handle, PrefabKind>,
}

impl TracingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(&self) -> usize {
        self.live.len()
    }
}

impl SceneBackend for TracingBackend {
    fn place(
        &mut self,
        prefab: PrefabKind,
        asset: &str,
        pose: Pose,
    ) -> Result<Handle, PlacementError> {
        self.next += 1;
        let handle = Handle(self.next);
        self.live.insert(handle, prefab);
        debug!(
            handle = handle.0,
            ?prefab,
            asset,
            x = pose.position.x,
            y = pose.position.y,
            z = pose.position.z,
            "place"
        );
        Ok(handle)
    }

    fn remove(&mut self, handle: Handle) {
        let prefab = self.live.remove(&handle);
        debug!(handle = handle.0, ?prefab, "remove");
    }
}

/// Logs counters whenever they change.
#[derive(Debug, Default)]
pub struct LogDisplay {
    last: Option<Counters>,
}

impl CounterDisplay for LogDisplay {
    fn update(&mut self, counters: Counters) {
        if self.last == Some(counters) {
            return;
        }
        info!(
            damage = counters.damage_markers,
            rescued = counters.rescued_victims,
            lost = counters.lost_victims,
            "Counters"
        );
        self.last = Some(counters);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_live_handles() {
        let mut b = TracingBackend::new();
        let h1 = b.place(PrefabKind::Wall, "prefabs/wall", Pose::default()).unwrap();
        let h2 = b.place(PrefabKind::Fire, "prefabs/fire", Pose::default()).unwrap();
        assert_ne!(h1, h2);
        assert_eq!(b.live(), 2);
        b.remove(h1);
        b.remove(h1);
        assert_eq!(b.live(), 1);
    }

    #[test]
    fn display_remembers_last_counters() {
        let mut d = LogDisplay::default();
        let c = Counters {
            damage_markers: 3,
            ..Default::default()
        };
        d.update(c);
        d.update(c);
        assert_eq!(d.last, Some(c));
    }
}
