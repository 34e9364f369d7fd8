//! Chainable handles returned by declarations

use super::Eltro;
use crate::models::{GroupId, TestId};

/// Handle to a freshly declared test
#[derive(Debug)]
pub struct TestHandle<'a> {
    eltro: &'a mut Eltro,
    id: TestId,
}

impl<'a> TestHandle<'a> {
    pub(super) fn new(eltro: &'a mut Eltro, id: TestId) -> Self {
        Self { eltro, id }
    }

    pub fn id(&self) -> TestId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.eltro.tree().test(self.id).name
    }

    /// Run only this test (and its ancestors) when any `only` is present
    pub fn only(self) -> Self {
        self.eltro.tree_mut().mark_test_exclusive(self.id);
        self
    }

    pub fn skip(self) -> Self {
        self.eltro.tree_mut().test_mut(self.id).skip = true;
        self
    }

    pub fn timeout(self, ms: u64) -> Self {
        if ms > 0 {
            self.eltro.tree_mut().test_mut(self.id).custom_timeout = Some(ms);
        }
        self
    }
}

/// Handle to a declared group
#[derive(Debug)]
pub struct GroupHandle<'a> {
    eltro: &'a mut Eltro,
    id: GroupId,
}

impl<'a> GroupHandle<'a> {
    pub(super) fn new(eltro: &'a mut Eltro, id: GroupId) -> Self {
        Self { eltro, id }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.eltro.tree().group(self.id).name
    }

    pub fn only(self) -> Self {
        self.eltro.tree_mut().mark_group_exclusive(self.id);
        self
    }

    pub fn skip(self) -> Self {
        self.eltro.tree_mut().group_mut(self.id).skip = true;
        self
    }

    /// Default deadline for tests in this group that set none themselves
    pub fn timeout(self, ms: u64) -> Self {
        if ms > 0 {
            self.eltro.tree_mut().group_mut(self.id).custom_timeout = Some(ms);
        }
        self
    }
}

/// Handle to a before/after hook
#[derive(Debug)]
pub struct HookHandle<'a> {
    eltro: &'a mut Eltro,
    id: TestId,
}

impl<'a> HookHandle<'a> {
    pub(super) fn new(eltro: &'a mut Eltro, id: TestId) -> Self {
        Self { eltro, id }
    }

    pub fn id(&self) -> TestId {
        self.id
    }

    pub fn timeout(self, ms: u64) -> Self {
        if ms > 0 {
            self.eltro.tree_mut().test_mut(self.id).custom_timeout = Some(ms);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::models::TestBody;
    use crate::Eltro;

    #[test]
    fn test_handle_modifiers() {
        let mut t = Eltro::new();
        t.describe("g", |t| {
            let handle = t.test("slow", || ())?.timeout(900).skip();
            assert_eq!(handle.name(), "g slow");
            t.before(TestBody::sync(|| ()))?.timeout(40);
            Ok(())
        })
        .unwrap()
        .timeout(70);

        let tree = t.tree();
        let group = tree.group(tree.find_group("g").unwrap());
        let slow = tree.test(tree.find_test("g slow").unwrap());
        assert_eq!(group.custom_timeout, Some(70));
        assert_eq!(slow.custom_timeout, Some(900));
        assert!(slow.skip);
        assert_eq!(tree.test(group.before.unwrap()).custom_timeout, Some(40));
    }

    #[test]
    fn test_group_handle_only() {
        let mut t = Eltro::new();
        let name = t
            .describe("focused", |_| Ok(()))
            .unwrap()
            .only()
            .name()
            .to_string();
        assert_eq!(name, "focused");

        let tree = t.tree();
        assert!(tree.group(tree.find_group("focused").unwrap()).is_exclusive);
        assert!(tree.has_exclusive());
    }

    #[test]
    fn test_only_ignores_modifier_order() {
        let mut t = Eltro::new();
        t.describe("first", |t| {
            t.test("a", || ())?.skip().only();
            Ok(())
        })
        .unwrap();
        t.describe("second", |t| {
            t.test("b", || ())?.only().skip();
            Ok(())
        })
        .unwrap();

        let tree = t.tree();
        assert!(tree.has_exclusive());
        for (group, test) in [("first", "first a"), ("second", "second b")] {
            let test = tree.test(tree.find_test(test).unwrap());
            assert!(test.skip);
            assert!(test.is_exclusive);
            assert!(tree.group(tree.find_group(group).unwrap()).has_exclusive);
        }
    }
}
