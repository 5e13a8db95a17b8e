//! Bulk loading — builds a static B+-Tree bottom-up from sorted entries.

use crate::error::{MinirelError, MinirelResult};
use crate::index::btree::{DataEntry, IndexHeader, NODE_HEADER_SIZE, Node};
use crate::storage::page::PAGE_SIZE;
use crate::storage::{IoStats, PageReader, Rid};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Split `total` items into nodes of at most `capacity` items. When the
/// tail would hold fewer than `minimum` items, the last two nodes share
/// the remainder evenly instead.
pub(crate) fn node_sizes(total: usize, capacity: usize, minimum: usize) -> Vec<usize> {
    let mut sizes = Vec::with_capacity(total / capacity.max(1) + 1);
    let mut remaining = total;
    while remaining > 0 {
        if remaining > capacity && remaining < capacity + minimum {
            let first = remaining / 2;
            sizes.push(first);
            sizes.push(remaining - first);
            break;
        }
        let take = remaining.min(capacity);
        sizes.push(take);
        remaining -= take;
    }
    sizes
}

/// Leaf sizes for `entries`: at most `capacity` entries and one page of
/// bytes per leaf. Packing by count alone is used whenever every leaf it
/// produces fits; otherwise leaves are filled greedily up to the byte
/// budget and an underfilled tail is split evenly with its neighbour when
/// both halves still fit.
pub(crate) fn leaf_sizes(
    entries: &[DataEntry],
    capacity: usize,
    minimum: usize,
) -> MinirelResult<Vec<usize>> {
    let budget = PAGE_SIZE - NODE_HEADER_SIZE;
    if let Some(entry) = entries.iter().find(|e| e.size_on_disk() > budget) {
        return Err(MinirelError::Index(format!(
            "key {} has {} rids, more than one {}-byte leaf can hold",
            entry.key,
            entry.rids.len(),
            PAGE_SIZE
        )));
    }
    let bytes = |range: &[DataEntry]| range.iter().map(DataEntry::size_on_disk).sum::<usize>();

    let by_count = node_sizes(entries.len(), capacity, minimum);
    let mut start = 0;
    let mut fits = true;
    for &size in &by_count {
        fits &= bytes(&entries[start..start + size]) <= budget;
        start += size;
    }
    if fits {
        return Ok(by_count);
    }

    let mut sizes = Vec::new();
    let (mut count, mut used) = (0, 0);
    for entry in entries {
        let size = entry.size_on_disk();
        if count == capacity || used + size > budget {
            sizes.push(count);
            count = 0;
            used = 0;
        }
        count += 1;
        used += size;
    }
    if count > 0 {
        sizes.push(count);
    }

    let n = sizes.len();
    if n >= 2 && sizes[n - 1] < minimum {
        let pair = sizes[n - 2] + sizes[n - 1];
        let tail = &entries[entries.len() - pair..];
        let first = pair / 2;
        if bytes(&tail[..first]) <= budget && bytes(&tail[first..]) <= budget {
            sizes[n - 2] = first;
            sizes[n - 1] = pair - first;
        }
    }
    debug!(leaves = sizes.len(), "leaf packing limited by page size");
    Ok(sizes)
}

/// 벌크 로더 — 정렬된 (키, Rid 목록) 엔트리로 리프부터 루트까지 순서대로 기록
pub struct BulkLoader {
    order: usize,
    stats: Arc<IoStats>,
}

impl BulkLoader {
    pub fn new(order: usize, stats: Arc<IoStats>) -> MinirelResult<Self> {
        if order == 0 {
            return Err(MinirelError::InvalidConfig(
                "B+-Tree order must be at least 1".to_string(),
            ));
        }
        Ok(Self { order, stats })
    }

    /// Write a tree over `entries` (ascending, distinct keys) to `path`.
    pub fn load(&self, entries: Vec<DataEntry>, path: &Path) -> MinirelResult<IndexHeader> {
        if entries.windows(2).any(|w| w[0].key >= w[1].key) {
            return Err(MinirelError::Precondition(
                "bulk load input must have strictly ascending keys".to_string(),
            ));
        }
        let mut out = BufWriter::new(File::create(path)?);
        let mut buf = Box::new([0u8; PAGE_SIZE]);

        // page 0 is reserved for the header
        out.write_all(&buf[..])?;
        let mut next_page: u32 = 1;

        // (smallest key in subtree, page id) for the level being built
        let mut level: Vec<(i32, u32)> = Vec::new();
        let leaf_sizes = if entries.is_empty() {
            vec![0]
        } else {
            leaf_sizes(&entries, 2 * self.order, self.order)?
        };
        let mut remaining = entries.into_iter();
        for size in &leaf_sizes {
            let chunk: Vec<DataEntry> = remaining.by_ref().take(*size).collect();
            let low = chunk.first().map_or(i32::MIN, |e| e.key);
            self.write_node(&mut out, &Node::Leaf(chunk), &mut buf)?;
            level.push((low, next_page));
            next_page += 1;
        }
        let leaf_count = level.len() as u32;

        let mut height = 1;
        while level.len() > 1 {
            let sizes = node_sizes(level.len(), 2 * self.order + 1, self.order + 1);
            let mut parents = Vec::with_capacity(sizes.len());
            let mut children = level.into_iter();
            for size in sizes {
                let group: Vec<(i32, u32)> = children.by_ref().take(size).collect();
                let low = group[0].0;
                let node = Node::Internal {
                    keys: group[1..].iter().map(|&(key, _)| key).collect(),
                    children: group.iter().map(|&(_, page)| page).collect(),
                };
                self.write_node(&mut out, &node, &mut buf)?;
                parents.push((low, next_page));
                next_page += 1;
            }
            level = parents;
            height += 1;
        }

        let header = IndexHeader {
            root: level[0].1,
            leaf_count,
            order: self.order as u32,
        };
        header.encode(&mut buf);
        out.seek(SeekFrom::Start(0))?;
        out.write_all(&buf[..])?;
        out.flush()?;
        self.stats.record_page_written();

        info!(
            path = %path.display(),
            leaves = leaf_count,
            height,
            pages = next_page,
            "B+-Tree bulk load complete"
        );
        Ok(header)
    }

    fn write_node(
        &self,
        out: &mut BufWriter<File>,
        node: &Node,
        buf: &mut [u8; PAGE_SIZE],
    ) -> MinirelResult<()> {
        node.encode(buf)?;
        out.write_all(&buf[..])?;
        self.stats.record_page_written();
        Ok(())
    }
}

/// Collect (key, Rid list) entries for column `key_column` of a base file,
/// ascending by key with each Rid list in storage order.
pub fn collect_entries(
    relation: &Path,
    key_column: usize,
    stats: Arc<IoStats>,
) -> MinirelResult<Vec<DataEntry>> {
    let mut reader = PageReader::open(relation, stats)?;
    let mut grouped: BTreeMap<i32, Vec<Rid>> = BTreeMap::new();
    while let Some((rid, tuple)) = reader.next_with_rid()? {
        if key_column >= tuple.width() {
            return Err(MinirelError::Schema(format!(
                "index key column {} out of range for width {}",
                key_column,
                tuple.width()
            )));
        }
        grouped.entry(tuple.get(key_column)).or_default().push(rid);
    }
    debug!(relation = %relation.display(), keys = grouped.len(), "collected index entries");
    Ok(grouped
        .into_iter()
        .map(|(key, rids)| DataEntry::new(key, rids))
        .collect())
}

/// Build an index of `order` over column `key_column` of `relation`.
pub fn build_index(
    relation: &Path,
    key_column: usize,
    order: usize,
    index_path: &Path,
    stats: Arc<IoStats>,
) -> MinirelResult<IndexHeader> {
    let loader = BulkLoader::new(order, Arc::clone(&stats))?;
    let entries = collect_entries(relation, key_column, stats)?;
    loader.load(entries, index_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_sizes_never_underfill() {
        // order 2: leaves of 4, minimum 2
        assert_eq!(node_sizes(8, 4, 2), vec![4, 4]);
        assert_eq!(node_sizes(9, 4, 2), vec![4, 2, 3]);
        assert_eq!(node_sizes(10, 4, 2), vec![4, 4, 2]);
        assert_eq!(node_sizes(5, 4, 2), vec![2, 3]);
        assert_eq!(node_sizes(1, 4, 2), vec![1]);
        assert!(node_sizes(0, 4, 2).is_empty());
        // internal nodes: 2d+1 = 5 children, minimum d+1 = 3
        assert_eq!(node_sizes(7, 5, 3), vec![3, 4]);
        assert_eq!(node_sizes(8, 5, 3), vec![5, 3]);
    }

    fn heavy(keys: i32, rids: u32) -> Vec<DataEntry> {
        (0..keys)
            .map(|k| DataEntry::new(k, (0..rids).map(|t| Rid::new(k as u32, t)).collect()))
            .collect()
    }

    #[test]
    fn test_leaf_sizes_match_count_packing_when_small() {
        let entries = heavy(9, 1);
        assert_eq!(leaf_sizes(&entries, 4, 2).unwrap(), node_sizes(9, 4, 2));
    }

    #[test]
    fn test_leaf_sizes_respect_page_bytes() {
        // 300 rids = 2408 bytes per entry: one entry per page whatever the order
        let entries = heavy(20, 300);
        let sizes = leaf_sizes(&entries, 2, 1).unwrap();
        assert_eq!(sizes, vec![1; 20]);

        // 100 rids = 808 bytes: five fit in a page, order 4 would allow eight
        let entries = heavy(12, 100);
        let sizes = leaf_sizes(&entries, 8, 4).unwrap();
        assert_eq!(sizes.iter().sum::<usize>(), 12);
        let mut start = 0;
        for size in &sizes {
            let bytes: usize = entries[start..start + size].iter().map(DataEntry::size_on_disk).sum();
            assert!(NODE_HEADER_SIZE + bytes <= PAGE_SIZE);
            start += size;
        }
        // greedy 5, 5, 2 with the tail rebalanced against its neighbour
        assert_eq!(sizes, vec![5, 3, 4]);
    }

    #[test]
    fn test_oversized_rid_list_rejected() {
        let entries = heavy(1, 600);
        assert!(matches!(
            leaf_sizes(&entries, 2, 1),
            Err(MinirelError::Index(_))
        ));
    }

    #[test]
    fn test_duplicate_heavy_load_fits_pages() {
        let tmp = tempfile::tempdir().unwrap();
        let loader = BulkLoader::new(1, Arc::new(IoStats::new())).unwrap();
        let header = loader.load(heavy(20, 300), &tmp.path().join("idx")).unwrap();
        assert_eq!(header.leaf_count, 20);
    }

    #[test]
    fn test_rejects_order_zero() {
        assert!(BulkLoader::new(0, Arc::new(IoStats::new())).is_err());
    }

    #[test]
    fn test_rejects_unsorted_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let loader = BulkLoader::new(2, Arc::new(IoStats::new())).unwrap();
        let entries = vec![
            DataEntry::new(5, vec![Rid::new(0, 0)]),
            DataEntry::new(1, vec![Rid::new(0, 1)]),
        ];
        assert!(loader.load(entries, &tmp.path().join("idx")).is_err());
    }

    #[test]
    fn test_layout_of_small_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let loader = BulkLoader::new(1, Arc::new(IoStats::new())).unwrap();
        let entries = (0..7).map(|k| DataEntry::new(k, vec![Rid::new(0, k as u32)])).collect();
        let header = loader.load(entries, &tmp.path().join("idx")).unwrap();
        // 7 entries, 2 per leaf, a final leaf of 1 is allowed with order 1
        assert_eq!(header.leaf_count, 4);
        assert_eq!(header.order, 1);
        // 4 leaves, at most 3 children per node: 3 + 1 would underfill, so 2 + 2 under a root
        assert_eq!(header.root, 4 + 2 + 1);
    }
}
