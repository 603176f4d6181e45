use std::cell::Cell;

use crate::constants::INSTANCE_ID_UNDEFINED;

thread_local! {
    static CURRENT_ID: Cell<i32> = const { Cell::new(INSTANCE_ID_UNDEFINED) };
}

/// Marks `id` as the current container for the lifetime of the guard.
///
/// Nested scopes stack: dropping a guard restores whatever id was current
/// when it was created, on every exit path.
#[must_use = "the scope ends as soon as the guard is dropped"]
pub struct ContainerScope {
    restore: i32,
}

impl ContainerScope {
    pub fn new(id: i32) -> Self {
        let restore = CURRENT_ID.with(|current| current.replace(id));
        Self { restore }
    }

    /// Container id active on this thread, or `INSTANCE_ID_UNDEFINED`.
    pub fn current_id() -> i32 {
        CURRENT_ID.with(Cell::get)
    }
}

impl Drop for ContainerScope {
    fn drop(&mut self) {
        CURRENT_ID.with(|current| current.set(self.restore));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_scopes_restore_previous_id() {
        assert_eq!(ContainerScope::current_id(), INSTANCE_ID_UNDEFINED);
        {
            let _outer = ContainerScope::new(5);
            assert_eq!(ContainerScope::current_id(), 5);
            {
                let _inner = ContainerScope::new(1_000_001);
                assert_eq!(ContainerScope::current_id(), 1_000_001);
            }
            assert_eq!(ContainerScope::current_id(), 5);
        }
        assert_eq!(ContainerScope::current_id(), INSTANCE_ID_UNDEFINED);
    }

    #[test]
    fn scope_is_thread_local() {
        let _scope = ContainerScope::new(7);
        let other = std::thread::spawn(ContainerScope::current_id)
            .join()
            .unwrap();
        assert_eq!(other, INSTANCE_ID_UNDEFINED);
        assert_eq!(ContainerScope::current_id(), 7);
    }

    #[test]
    fn scope_restores_on_early_return() {
        fn inner(bail: bool) -> Option<i32> {
            let _scope = ContainerScope::new(9);
            if bail {
                return None;
            }
            Some(ContainerScope::current_id())
        }
        assert_eq!(inner(false), Some(9));
        assert_eq!(inner(true), None);
        assert_eq!(ContainerScope::current_id(), INSTANCE_ID_UNDEFINED);
    }
}
