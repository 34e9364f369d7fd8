//! Group/test tree
//!
//! Groups and tests live in flat tables and refer to each other by index.
//! Exclusivity ("only") is propagated upward over parent indices at
//! declaration time, so the executor only ever reads flags.

use std::fmt;

use super::body::TestBody;
use super::test_result::{TestError, TestKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestId(pub(crate) usize);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "test#{}", self.0)
    }
}

/// A named container of tests and nested groups
#[derive(Debug)]
pub struct GroupNode {
    pub name: String,
    pub parent: Option<GroupId>,
    pub groups: Vec<GroupId>,
    pub tests: Vec<TestId>,
    pub skip: bool,
    /// This group or something beneath it was marked exclusive
    pub has_exclusive: bool,
    /// `only()` was called on this group itself
    pub is_exclusive: bool,
    pub custom_timeout: Option<u64>,
    pub before: Option<TestId>,
    pub after: Option<TestId>,
}

impl GroupNode {
    fn new(name: String, parent: Option<GroupId>) -> Self {
        Self {
            name,
            parent,
            groups: Vec::new(),
            tests: Vec::new(),
            skip: false,
            has_exclusive: false,
            is_exclusive: false,
            custom_timeout: None,
            before: None,
            after: None,
        }
    }
}

/// A test or a before/after hook
#[derive(Debug)]
pub struct TestNode {
    pub name: String,
    pub group: GroupId,
    pub kind: TestKind,
    pub body: TestBody,
    pub skip: bool,
    pub is_exclusive: bool,
    pub custom_timeout: Option<u64>,
    pub error: Option<TestError>,
}

/// Arena holding every group and test registered in a run
#[derive(Debug, Default)]
pub struct TestTree {
    groups: Vec<GroupNode>,
    tests: Vec<TestNode>,
    roots: Vec<GroupId>,
    has_exclusive: bool,
}

impl TestTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.tests.clear();
        self.roots.clear();
        self.has_exclusive = false;
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Whether any `only()` took effect anywhere in the tree
    pub fn has_exclusive(&self) -> bool {
        self.has_exclusive
    }

    pub fn roots(&self) -> &[GroupId] {
        &self.roots
    }

    pub fn group(&self, id: GroupId) -> &GroupNode {
        &self.groups[id.0]
    }

    pub fn group_mut(&mut self, id: GroupId) -> &mut GroupNode {
        &mut self.groups[id.0]
    }

    pub fn test(&self, id: TestId) -> &TestNode {
        &self.tests[id.0]
    }

    pub fn test_mut(&mut self, id: TestId) -> &mut TestNode {
        &mut self.tests[id.0]
    }

    pub fn test_count(&self) -> usize {
        self.tests.iter().filter(|t| t.kind == TestKind::Test).count()
    }

    /// Look up a group by its full display name
    pub fn find_group(&self, name: &str) -> Option<GroupId> {
        self.groups.iter().position(|g| g.name == name).map(GroupId)
    }

    /// Look up a test by its full display name
    pub fn find_test(&self, name: &str) -> Option<TestId> {
        self.tests
            .iter()
            .position(|t| t.kind == TestKind::Test && t.name == name)
            .map(TestId)
    }

    /// Add a group. Nested groups take the parent's name as prefix and
    /// inherit its timeout.
    pub fn add_group(&mut self, parent: Option<GroupId>, name: &str) -> GroupId {
        let id = GroupId(self.groups.len());
        let node = match parent {
            Some(p) => {
                let parent_node = &self.groups[p.0];
                let mut node = GroupNode::new(format!("{} {}", parent_node.name, name), Some(p));
                node.custom_timeout = parent_node.custom_timeout;
                node
            }
            None => GroupNode::new(name.to_string(), None),
        };
        self.groups.push(node);

        match parent {
            Some(p) => self.groups[p.0].groups.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn add_test(&mut self, group: GroupId, name: &str, body: TestBody) -> TestId {
        let id = TestId(self.tests.len());
        let full_name = format!("{} {}", self.groups[group.0].name, name);
        self.tests.push(TestNode {
            name: full_name,
            group,
            kind: TestKind::Test,
            body,
            skip: false,
            is_exclusive: false,
            custom_timeout: None,
            error: None,
        });
        self.groups[group.0].tests.push(id);
        id
    }

    /// Attach a before/after hook, replacing any previous one
    pub fn set_hook(&mut self, group: GroupId, kind: TestKind, body: TestBody) -> TestId {
        let id = TestId(self.tests.len());
        let g = &self.groups[group.0];
        self.tests.push(TestNode {
            name: format!("{}: {}", kind.label(), g.name),
            group,
            kind,
            body,
            skip: false,
            is_exclusive: false,
            custom_timeout: None,
            error: None,
        });

        let g = &mut self.groups[group.0];
        match kind {
            TestKind::Before => g.before = Some(id),
            TestKind::After => g.after = Some(id),
            TestKind::Test => unreachable!("plain tests are added with add_test"),
        }
        id
    }

    /// Mark a group as exclusive
    pub fn mark_group_exclusive(&mut self, id: GroupId) {
        self.groups[id.0].is_exclusive = true;
        self.propagate_exclusive(id, false);
    }

    /// Mark a test as exclusive, whether or not it is skipped
    pub fn mark_test_exclusive(&mut self, id: TestId) {
        let test = &mut self.tests[id.0];
        test.is_exclusive = true;
        let group = test.group;
        self.propagate_exclusive(group, true);
    }

    /// Walk from `start` to the root setting `has_exclusive`.
    ///
    /// Stops at the first skipped group without touching it or anything
    /// above it, and in that case leaves the tree-wide flag alone too.
    fn propagate_exclusive(&mut self, start: GroupId, mark_start: bool) {
        if self.groups[start.0].skip {
            return;
        }
        let node = &mut self.groups[start.0];
        node.has_exclusive = node.has_exclusive || mark_start;

        let mut cursor = node.parent;
        while let Some(id) = cursor {
            let g = &mut self.groups[id.0];
            if g.skip {
                return;
            }
            g.has_exclusive = true;
            cursor = g.parent;
        }

        self.has_exclusive = true;
    }

    /// Whether a root group is selected for this pass
    pub fn root_eligible(&self, id: GroupId) -> bool {
        let g = &self.groups[id.0];
        !g.skip && self.has_exclusive == (g.has_exclusive || g.is_exclusive)
    }

    /// Whether a child group is selected, given its parent's mode
    pub fn child_group_eligible(&self, parent: GroupId, child: GroupId) -> bool {
        let p = &self.groups[parent.0];
        let c = &self.groups[child.0];
        !c.skip && p.has_exclusive == (c.has_exclusive || c.is_exclusive)
    }

    /// Whether a direct test survives its group's exclusivity filter.
    /// Skipped tests still pass the filter; they are reported as skipped.
    pub fn test_selected(&self, group: GroupId, test: TestId) -> bool {
        self.tests[test.0].is_exclusive == self.groups[group.0].has_exclusive
    }
}
