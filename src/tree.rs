//! PUCT search tree with arena allocation.
//!
//! Nodes are stored in a contiguous Vec and referenced by [`NodeId`]. The
//! tree does not store positions: it borrows the game state for the whole
//! search, plays the selected path onto it for each simulation and takes the
//! moves back afterwards.

use shakmaty::uci::UciMove;

use crate::{
    config::{SearchConfig, ValueBackup},
    error::EngineError,
    evaluator::{Evaluator, evaluate_position},
    moves::MoveVocabulary,
    node::{Node, NodeId},
    position::GameState,
    types::{EvaluationResult, MoveProbability},
};

const ROOT: NodeId = NodeId(0);

pub struct Tree<'a, E: Evaluator> {
    /// Arena storing all nodes, root first
    nodes: Vec<Node>,
    state: &'a mut GameState,
    evaluator: &'a mut E,
    vocabulary: &'a MoveVocabulary,
    config: SearchConfig,
}

/// Statistics about a search tree.
#[derive(Debug, Clone)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    /// Mean value for the side to move at the root
    pub root_value: f32,
    pub max_depth: u32,
}

impl<'a, E: Evaluator> Tree<'a, E> {
    /// Create an empty tree rooted at the current position of `state`.
    pub fn new(
        state: &'a mut GameState,
        evaluator: &'a mut E,
        vocabulary: &'a MoveVocabulary,
        config: SearchConfig,
    ) -> Self {
        Self {
            nodes: vec![Node::new_root()],
            state,
            evaluator,
            vocabulary,
            config,
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        ROOT
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    fn allocate(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn arena(&self) -> &[Node] {
        &self.nodes
    }

    /// Walk down from the root, taking the child with the highest PUCT score
    /// at each step, until a node without children is reached. That node is
    /// either unexpanded or terminal.
    ///
    /// Returns the node and the path of nodes below the root leading to it.
    pub fn select(&self) -> (NodeId, Vec<NodeId>) {
        let mut path = Vec::new();
        let mut current = ROOT;
        while let Some(child) = self.select_child(current) {
            path.push(child);
            current = child;
        }
        (current, path)
    }

    /// Child with the maximum PUCT score; the first one wins ties.
    fn select_child(&self, id: NodeId) -> Option<NodeId> {
        let node = self.get(id);
        let mut best: Option<(NodeId, f32)> = None;
        for &child in &node.children {
            let score =
                self.get(child)
                    .puct_score(node.visit_count, self.config.c_puct, self.config.fpu);
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((child, score));
            }
        }
        best.map(|(child, _)| child)
    }

    /// Evaluate the node's position and add one child per legal move, in
    /// policy order.
    ///
    /// The moves leading to the node are played onto the game state and taken
    /// back afterwards.
    pub fn expand(&mut self, id: NodeId) -> Result<(), EngineError> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.get(current).parent {
            path.push(current);
            current = parent;
        }
        path.reverse();

        self.at_path(&path, |tree| tree.expand_here(id))
    }

    /// Expand `id` at the current position of the game state, which must be
    /// the node's position.
    fn expand_here(&mut self, id: NodeId) -> Result<(), EngineError> {
        let node = self.get(id);
        if node.is_expanded() || !node.is_leaf() {
            return Err(EngineError::AlreadyExpanded(id.0));
        }
        if self.state.is_game_over() {
            return Err(EngineError::TerminalExpansion(id.0));
        }

        let EvaluationResult { policy, value } =
            evaluate_position(&mut *self.evaluator, self.state, self.vocabulary)?;
        if policy.is_empty() {
            return Err(EngineError::NoLegalMoves);
        }

        for MoveProbability { uci, probability } in policy {
            let child = self.allocate(Node::new_child(id, uci, probability));
            self.get_mut(id).children.push(child);
        }
        self.get_mut(id).eval_score = Some(value);

        log::trace!(
            "expanded node {} at {} with value {:.3} and {} children",
            id.0,
            self.state.fen(),
            value,
            self.get(id).children.len()
        );
        Ok(())
    }

    /// Add the node's evaluation to every node from it up to the root.
    pub fn backpropagate(&mut self, leaf: NodeId) -> Result<(), EngineError> {
        let value = self
            .get(leaf)
            .eval_score
            .ok_or(EngineError::NotEvaluated(leaf.0))?;
        let alternate = self.config.backup == ValueBackup::Negamax;
        // The leaf's own statistics are seen from the player who moved into
        // it, the opponent of the side the evaluation is for.
        let mut signed = if alternate { -value } else { value };

        let mut current = Some(leaf);
        while let Some(id) = current {
            let node = self.get_mut(id);
            node.visit_count += 1;
            node.total_action_value += signed;
            if alternate {
                signed = -signed;
            }
            current = node.parent;
        }
        Ok(())
    }

    /// Run one simulation: select, expand (or score a terminal position),
    /// backpropagate.
    pub fn step(&mut self) -> Result<(), EngineError> {
        let (leaf, path) = self.select();
        self.at_path(&path, |tree| tree.evaluate_leaf(leaf))?;
        self.backpropagate(leaf)
    }

    /// Simulate until the root has been visited `simulations` times.
    pub fn run(&mut self) -> Result<(), EngineError> {
        while self.get(ROOT).visit_count < self.config.simulations {
            self.step()?;
        }
        let stats = self.stats();
        log::debug!(
            "search done: {} nodes, depth {}, root value {:.3}",
            stats.total_nodes,
            stats.max_depth,
            stats.root_value
        );
        Ok(())
    }

    /// Run `f` with the moves of `path` played onto the game state, then take
    /// them back whether or not `f` succeeded.
    fn at_path(
        &mut self,
        path: &[NodeId],
        f: impl FnOnce(&mut Self) -> Result<(), EngineError>,
    ) -> Result<(), EngineError> {
        let base_ply = self.state.ply();
        let result = self.play_path(path).and_then(|()| f(self));
        while self.state.ply() > base_ply {
            self.state.pop()?;
        }
        result
    }

    fn play_path(&mut self, path: &[NodeId]) -> Result<(), EngineError> {
        for &id in path {
            if let Some(mv) = &self.nodes[id.index()].mv {
                self.state.push(mv)?;
            }
        }
        Ok(())
    }

    fn evaluate_leaf(&mut self, id: NodeId) -> Result<(), EngineError> {
        match self.state.terminal_value() {
            Some(value) => {
                self.get_mut(id).eval_score = Some(value);
                Ok(())
            }
            None => self.expand_here(id),
        }
    }

    /// Root child with the most visits; the first one wins ties.
    pub fn best_child(&self) -> Option<NodeId> {
        let mut best: Option<(NodeId, u32)> = None;
        for &child in &self.get(ROOT).children {
            let visits = self.get(child).visit_count;
            if best.is_none_or(|(_, best_visits)| visits > best_visits) {
                best = Some((child, visits));
            }
        }
        best.map(|(child, _)| child)
    }

    /// The move to play: the most visited root child.
    pub fn choose_move(&self) -> Result<UciMove, EngineError> {
        self.best_child()
            .and_then(|id| self.get(id).mv.clone())
            .ok_or(EngineError::RootNotExpanded)
    }

    /// Visit counts of the root children normalized to sum to 1.
    pub fn visit_distribution(&self) -> Vec<MoveProbability> {
        let children = &self.get(ROOT).children;
        let total: u32 = children.iter().map(|&id| self.get(id).visit_count).sum();
        if total == 0 {
            return Vec::new();
        }
        children
            .iter()
            .filter_map(|&id| {
                let node = self.get(id);
                node.mv.clone().map(|uci| MoveProbability {
                    uci,
                    probability: node.visit_count as f32 / total as f32,
                })
            })
            .collect()
    }

    /// Mean value of the root for its side to move.
    pub fn root_value(&self) -> f32 {
        let q = self.get(ROOT).mean_action_value(self.config.fpu);
        match self.config.backup {
            ValueBackup::Negamax => -q,
            ValueBackup::SameSign => q,
        }
    }

    pub fn stats(&self) -> TreeStats {
        // Children are always allocated after their parent.
        let mut depths = vec![0u32; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = node.parent {
                depths[i] = depths[parent.index()] + 1;
            }
        }
        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: self.get(ROOT).visit_count,
            root_value: self.root_value(),
            max_depth: depths.into_iter().max().unwrap_or(0),
        }
    }
}
