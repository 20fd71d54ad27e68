use std::collections::HashSet;
use std::fmt;

/// 組織的なコンテナ（グループ/組織/プロジェクト）とその親
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeNode {
    /// スコープのID
    pub id: String,

    /// 親スコープのID（ルートはNone）
    pub parent: Option<String>,
}

impl ScopeNode {
    /// ルートスコープを作成
    pub fn root(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent: None,
        }
    }

    /// 子スコープを作成
    pub fn child(id: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent: Some(parent.into()),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl fmt::Display for ScopeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// 列挙対象スコープの平坦な集合
///
/// 挿入順を保持し、同じスコープは二度追加されない。ルートは常に先頭に入る。
#[derive(Debug, Clone)]
pub struct ScopeSet {
    nodes: Vec<ScopeNode>,
    seen: HashSet<String>,
}

impl ScopeSet {
    /// ルートだけを含む集合を作成
    pub fn new(root: impl Into<String>) -> Self {
        let root = ScopeNode::root(root);
        let mut seen = HashSet::new();
        seen.insert(root.id.clone());
        Self {
            nodes: vec![root],
            seen,
        }
    }

    /// 子スコープを追加（既出なら無視してfalseを返す）
    pub fn push_child(&mut self, id: impl Into<String>, parent: impl Into<String>) -> bool {
        let node = ScopeNode::child(id, parent);
        if !self.seen.insert(node.id.clone()) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    pub fn root(&self) -> &ScopeNode {
        &self.nodes[0]
    }

    pub fn nodes(&self) -> &[ScopeNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// スコープIDの一覧（ルートが先頭）
    pub fn ids(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }
}
