//! Search tree node.
//!
//! Each node represents a position reached by playing `mv` from its parent.
//! Nodes live in the tree's arena and refer to each other by [`NodeId`]; the
//! parent link is only used to walk back up during backpropagation.

use shakmaty::uci::UciMove;

/// Index into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    /// Parent node (None for root)
    pub parent: Option<NodeId>,

    /// Children in policy order. Empty until the node is expanded.
    pub children: Vec<NodeId>,

    /// Move that led here from the parent, in absolute coordinates
    pub mv: Option<UciMove>,

    /// Probability the parent's expansion assigned to `mv`
    pub prior: Option<f32>,

    pub visit_count: u32,

    /// Sum of backpropagated values, W(s,a)
    pub total_action_value: f32,

    /// Value for the side to move here, set by expansion or by the game
    /// outcome when the position is terminal
    pub eval_score: Option<f32>,
}

impl Node {
    pub fn new_root() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            mv: None,
            prior: None,
            visit_count: 0,
            total_action_value: 0.0,
            eval_score: None,
        }
    }

    pub fn new_child(parent: NodeId, mv: UciMove, prior: f32) -> Self {
        Self {
            parent: Some(parent),
            mv: Some(mv),
            prior: Some(prior),
            ..Self::new_root()
        }
    }

    /// Q(s,a) = W / N, or the first-play urgency `fpu` if never visited.
    #[inline]
    pub fn mean_action_value(&self, fpu: f32) -> f32 {
        if self.visit_count == 0 {
            fpu
        } else {
            self.total_action_value / self.visit_count as f32
        }
    }

    /// PUCT(s,a) = Q + c_puct * P * sqrt(N_parent - 1) / (1 + N)
    ///
    /// Never cached: Q and N change between selections.
    #[inline]
    pub fn puct_score(&self, parent_visits: u32, c_puct: f32, fpu: f32) -> f32 {
        let prior = self.prior.unwrap_or(0.0);
        let exploration = (parent_visits.saturating_sub(1) as f32).sqrt();
        let u = c_puct * prior * exploration / (1.0 + self.visit_count as f32);
        self.mean_action_value(fpu) + u
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.visit_count == 0
    }

    #[inline]
    pub fn is_expanded(&self) -> bool {
        !self.children.is_empty()
    }
}
