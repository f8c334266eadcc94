//! 加权区域扩张
//!
//! 文化、国家、省份、宗教共用的多源 Dijkstra：每个种子从代价 0 出发，
//! 按累计代价从低到高向邻居扩张；代价更低的路径可以抢走已被占据的单元格，
//! 超过上限的路径被放弃。各图层只提供自己的单步代价函数。

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// 扩张队列条目，代价相同时先入先出
struct QueueEntry<Id> {
    cost: f64,
    seq: u64,
    cell: u32,
    owner: Id,
}

impl<Id> PartialEq for QueueEntry<Id> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<Id> Eq for QueueEntry<Id> {}

impl<Id> PartialOrd for QueueEntry<Id> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Id> Ord for QueueEntry<Id> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap 是最大堆，反转后得到最小堆
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// 从若干种子出发扩张
///
/// - `step(owner, from, to)` 返回进入 `to` 的代价，`None` 表示不能进入
/// - `claims(cell)` 决定到达的单元格是否记到所有者名下（水域通常只能穿过）
///
/// 返回每个单元格的最低累计代价，未到达的为无穷大
pub fn expand<Id, S, C>(
    neighbors: &[Vec<u32>],
    seeds: &[(u32, Id)],
    max_cost: f64,
    assignment: &mut [Id],
    step: S,
    claims: C,
) -> Vec<f64>
where
    Id: Copy,
    S: FnMut(Id, usize, usize) -> Option<f64>,
    C: Fn(usize) -> bool,
{
    let mut frontier = Frontier::new(neighbors.len());
    frontier.grow(neighbors, seeds, max_cost, assignment, step, claims);
    frontier.cost
}

/// 可反复使用的扩张缓冲区
///
/// 每次 [`Frontier::grow`] 只重置上一次到达过的单元格，
/// 大网格上多次小范围扩张不必每次分配整张代价表。
pub struct Frontier<Id> {
    cost: Vec<f64>,
    reached: Vec<u32>,
    heap: BinaryHeap<QueueEntry<Id>>,
}

impl<Id: Copy> Frontier<Id> {
    pub fn new(len: usize) -> Self {
        Self {
            cost: vec![f64::INFINITY; len],
            reached: Vec::new(),
            heap: BinaryHeap::new(),
        }
    }

    /// 单元格在最近一次扩张中的最低累计代价
    pub fn cost(&self, cell: usize) -> f64 {
        self.cost[cell]
    }

    fn reach(&mut self, cell: usize, cost: f64) {
        if self.cost[cell].is_infinite() {
            self.reached.push(cell as u32);
        }
        self.cost[cell] = cost;
    }

    /// 扩张一次，返回本次到达的单元格（含只穿过、未记名的单元格）
    pub fn grow<S, C>(
        &mut self,
        neighbors: &[Vec<u32>],
        seeds: &[(u32, Id)],
        max_cost: f64,
        assignment: &mut [Id],
        mut step: S,
        claims: C,
    ) -> &[u32]
    where
        S: FnMut(Id, usize, usize) -> Option<f64>,
        C: Fn(usize) -> bool,
    {
        for &cell in &self.reached {
            self.cost[cell as usize] = f64::INFINITY;
        }
        self.reached.clear();
        self.heap.clear();
        let mut seq = 0u64;

        for &(cell, owner) in seeds {
            self.reach(cell as usize, 0.0);
            assignment[cell as usize] = owner;
            self.heap.push(QueueEntry {
                cost: 0.0,
                seq,
                cell,
                owner,
            });
            seq += 1;
        }

        while let Some(QueueEntry {
            cost: current,
            cell,
            owner,
            ..
        }) = self.heap.pop()
        {
            let cell = cell as usize;
            // 已被更便宜的路径取代
            if current > self.cost[cell] {
                continue;
            }
            for &next in &neighbors[cell] {
                let next = next as usize;
                let Some(step_cost) = step(owner, cell, next) else {
                    continue;
                };
                let total = current + step_cost;
                if total > max_cost || total >= self.cost[next] {
                    continue;
                }
                if claims(next) {
                    assignment[next] = owner;
                }
                self.reach(next, total);
                self.heap.push(QueueEntry {
                    cost: total,
                    seq,
                    cell: next as u32,
                    owner,
                });
                seq += 1;
            }
        }

        &self.reached
    }
}

/// 出现次数最多的编号及其次数，次数相同时取编号最小者
pub fn majority<Id: Copy + Ord>(ids: &[Id]) -> Option<(Id, usize)> {
    let mut sorted = ids.to_vec();
    sorted.sort_unstable();
    let mut best: Option<(Id, usize)> = None;
    for run in sorted.chunk_by(|a, b| a == b) {
        if best.is_none_or(|(_, n)| run.len() > n) {
            best = Some((run[0], run.len()));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn majority_prefers_count_then_lowest_id() {
        assert_eq!(majority(&[3u16, 1, 3, 2]), Some((3, 2)));
        assert_eq!(majority(&[5u16, 2, 5, 2]), Some((2, 2)));
        assert_eq!(majority::<u16>(&[]), None);
    }

    /// 0-1-2-...-(n-1) 的链
    fn chain(n: u32) -> Vec<Vec<u32>> {
        (0..n)
            .map(|i| {
                let mut v = Vec::new();
                if i > 0 {
                    v.push(i - 1);
                }
                if i + 1 < n {
                    v.push(i + 1);
                }
                v
            })
            .collect()
    }

    #[test]
    fn two_seeds_split_a_chain() {
        let neighbors = chain(10);
        let mut owner = vec![0u8; 10];
        expand(&neighbors, &[(0, 1), (9, 2)], 100.0, &mut owner, |_, _, _| Some(1.0), |_| true);
        assert_eq!(&owner[..5], &[1; 5]);
        assert_eq!(&owner[5..], &[2; 5]);
    }

    #[test]
    fn cheaper_owner_steals_cells() {
        let neighbors = chain(10);
        let mut owner = vec![0u8; 10];
        // 2 号的扩张力是 1 号的 4 倍
        expand(
            &neighbors,
            &[(0, 1), (9, 2)],
            100.0,
            &mut owner,
            |o, _, _| Some(if o == 2 { 1.0 } else { 4.0 }),
            |_| true,
        );
        assert_eq!(owner.iter().filter(|&&o| o == 2).count(), 8);
    }

    #[test]
    fn cap_stops_growth() {
        let neighbors = chain(10);
        let mut owner = vec![0u8; 10];
        let cost = expand(&neighbors, &[(0, 1)], 3.0, &mut owner, |_, _, _| Some(1.0), |_| true);
        assert_eq!(owner, vec![1, 1, 1, 1, 0, 0, 0, 0, 0, 0]);
        assert!(cost[5].is_infinite());
    }

    #[test]
    fn frontier_forgets_the_previous_growth() {
        let neighbors = chain(8);
        let mut owner = vec![0u8; 8];
        let mut frontier = Frontier::new(8);
        let step = |_: u8, _: usize, _: usize| Some(1.0);
        let first = frontier.grow(&neighbors, &[(0, 1)], 2.0, &mut owner, step, |_| true);
        assert_eq!(first, &[0, 1, 2]);
        // 第二次扩张从 7 号出发，不受上一次代价表影响
        let second = frontier.grow(
            &neighbors,
            &[(7, 2)],
            100.0,
            &mut owner,
            |_, _, to| (to >= 3).then_some(1.0),
            |_| true,
        );
        assert_eq!(second.len(), 5);
        assert_eq!(owner, vec![1, 1, 1, 2, 2, 2, 2, 2]);
        assert!(frontier.cost(0).is_infinite());
        assert_eq!(frontier.cost(3), 4.0);
    }

    #[test]
    fn blocked_and_unclaimed_cells() {
        let neighbors = chain(6);
        let mut owner = vec![0u8; 6];
        // 2 号单元格只能穿过，4 号单元格不能进入
        expand(
            &neighbors,
            &[(0, 7)],
            100.0,
            &mut owner,
            |_, _, to| (to != 4).then_some(1.0),
            |cell| cell != 2,
        );
        assert_eq!(owner, vec![7, 7, 0, 7, 0, 0]);
    }
}
