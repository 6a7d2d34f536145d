use core::{
    fmt,
    ops::{Add, AddAssign},
    ptr::NonNull,
};

use crate::node::{links_mut, Node};

/// The elementary rebalancing steps performed by one insertion or removal.
///
/// A rotation moves a node above its parent; a promotion or demotion raises or lowers a
/// node's stored height by one without touching its children. A double rotation counts as
/// two rotations.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rebalance {
    /// Single rotations, with each half of a double rotation counted separately.
    pub rotations: usize,
    /// Heights raised by one.
    pub promotions: usize,
    /// Heights lowered by one.
    pub demotions: usize,
}

impl Rebalance {
    /// No rebalancing was needed.
    pub const NONE: Rebalance = Rebalance {
        rotations: 0,
        promotions: 0,
        demotions: 0,
    };

    /// Returns the total number of rebalancing steps.
    pub const fn ops(&self) -> usize {
        self.rotations + self.promotions + self.demotions
    }

    /// Returns `true` if the tree was balanced without any step.
    pub const fn is_none(&self) -> bool {
        self.ops() == 0
    }

    #[inline]
    pub(crate) unsafe fn promote<V>(&mut self, node: NonNull<Node<V>>) {
        unsafe {
            let links = links_mut(node);
            links.set_height(links.height().checked_add(1).expect("height overflow"));
        }
        self.promotions += 1;
    }

    #[inline]
    pub(crate) unsafe fn demote<V>(&mut self, node: NonNull<Node<V>>) {
        unsafe {
            let links = links_mut(node);
            links.set_height(links.height().checked_sub(1).expect("height underflow"));
        }
        self.demotions += 1;
    }

    #[inline]
    pub(crate) fn rotated(&mut self, times: usize) {
        self.rotations += times;
    }
}

impl Add for Rebalance {
    type Output = Rebalance;

    fn add(mut self, rhs: Rebalance) -> Rebalance {
        self += rhs;
        self
    }
}

impl AddAssign for Rebalance {
    fn add_assign(&mut self, rhs: Rebalance) {
        self.rotations += rhs.rotations;
        self.promotions += rhs.promotions;
        self.demotions += rhs.demotions;
    }
}

impl fmt::Display for Rebalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ops ({} rotations, {} promotions, {} demotions)",
            self.ops(),
            self.rotations,
            self.promotions,
            self.demotions
        )
    }
}
