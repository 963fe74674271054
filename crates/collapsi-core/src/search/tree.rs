//! 探索木の記録とバイナリ出力
//!
//! 記録するのは探索中に実際に展開した辺だけ（手番側の着手 s → t と、
//! 相手の応手 t → u）。打ち切られた候補手の先は含まれない。
//!
//! # バイナリ形式（リトルエンディアン）
//!
//! ```text
//! magic      [u8; 4] = "CLPT"
//! version    u16
//! key_bytes  u8       (8 / 16)
//! node_count u32
//! node_count 回:
//!   key      [u8; key_bytes]
//!   turn     u8
//!   flags    u8       (bit0: 答えあり, bit1: 勝ち)
//!   best     u8
//!   plies    u16
//!   children u16
//!   children 回: key [u8; key_bytes]
//! ```
//!
//! ノードはルートからの幅優先順。

use std::collections::{HashMap, HashSet, VecDeque};
use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use super::solver::Answer;
use crate::hash::{KeyWidth, StateKey};
use crate::types::Side;

pub const TREE_MAGIC: [u8; 4] = *b"CLPT";
pub const TREE_VERSION: u16 = 1;

/// 探索木のノード
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub turn: Side,
    pub children: Vec<StateKey>,
    /// 置換表に登録された答え（手番側の着手直後の局面は None のことがある）
    pub answer: Option<Answer>,
}

/// 探索木（キー → ノード）
#[derive(Debug, Clone)]
pub struct SearchTree {
    key_width: KeyWidth,
    nodes: HashMap<StateKey, TreeNode>,
}

impl SearchTree {
    pub fn new(key_width: KeyWidth) -> SearchTree {
        SearchTree {
            key_width,
            nodes: HashMap::new(),
        }
    }

    #[inline]
    pub fn key_width(&self) -> KeyWidth {
        self.key_width
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn get(&self, key: &StateKey) -> Option<&TreeNode> {
        self.nodes.get(key)
    }

    /// ノードを登録する。既存ノードの子は空のときだけ置き換え、答えは上書きする。
    pub fn record(
        &mut self,
        key: StateKey,
        turn: Side,
        children: Vec<StateKey>,
        answer: Option<Answer>,
    ) {
        let node = self.nodes.entry(key).or_insert_with(|| TreeNode {
            turn,
            children: Vec::new(),
            answer: None,
        });
        if node.children.is_empty() {
            node.children = children;
        }
        if answer.is_some() {
            node.answer = answer;
        }
    }

    /// `root` から到達できるノードを幅優先順に返す
    pub fn reachable(&self, root: StateKey) -> Vec<(StateKey, &TreeNode)> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([root]);
        seen.insert(root);
        while let Some(key) = queue.pop_front() {
            let Some(node) = self.nodes.get(&key) else {
                continue;
            };
            for child in &node.children {
                if seen.insert(*child) {
                    queue.push_back(*child);
                }
            }
            out.push((key, node));
        }
        out
    }

    /// `root` 以下の部分木をバイナリ形式で書き出す
    pub fn write_to<W: Write>(&self, root: StateKey, mut w: W) -> io::Result<usize> {
        let nodes = self.reachable(root);
        let key_bytes = self.key_width.bytes();
        let mut buf = [0u8; 16];

        w.write_all(&TREE_MAGIC)?;
        w.write_u16::<LittleEndian>(TREE_VERSION)?;
        w.write_u8(key_bytes as u8)?;
        w.write_u32::<LittleEndian>(nodes.len() as u32)?;
        for (key, node) in &nodes {
            key.to_le_bytes(&mut buf);
            w.write_all(&buf[..key_bytes])?;
            w.write_u8(node.turn as u8)?;
            let (flags, best, plies) = match node.answer {
                Some(a) => (1 | if a.win { 2 } else { 0 }, a.best.raw(), a.plies),
                None => (0, 0xFF, 0),
            };
            w.write_u8(flags)?;
            w.write_u8(best)?;
            w.write_u16::<LittleEndian>(plies)?;
            w.write_u16::<LittleEndian>(node.children.len() as u16)?;
            for child in &node.children {
                child.to_le_bytes(&mut buf);
                w.write_all(&buf[..key_bytes])?;
            }
        }
        w.flush()?;
        Ok(nodes.len())
    }
}
