//! External Sort Operator — bounded-memory multi-pass merge sort
//!
//! Pass 0 reads `buffer_pages` pages of input at a time, sorts them in
//! memory and writes each batch as a run file. Every following pass merges
//! groups of `buffer_pages - 1` runs until one run is left; output is then
//! read back from that final run. Run files live in a private temporary
//! directory and input runs are deleted as soon as their merge finishes.

use crate::error::{MinirelError, MinirelResult};
use crate::sql::executor::context::ExecContext;
use crate::sql::executor::operators::block_cache::BlockCache;
use crate::sql::executor::operators::sort::{
    SortKeys, check_sort_keys, compare_on_keys, resolve_sort_keys,
};
use crate::sql::executor::operators::{Lookahead, PhysicalOperator, SeekableSource, TupleSource};
use crate::storage::{IoStats, PageReader, PageWriter};
use crate::types::{ColumnRef, Header, Tuple};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::debug;

/// 외부 정렬 연산자 — 제한된 버퍼 페이지로 런 생성 후 다단계 병합
pub struct ExternalSort {
    input: BlockCache,
    header: Header,
    keys: SortKeys,
    buffer_pages: usize,
    temp_root: PathBuf,
    stats: Arc<IoStats>,
    /// Directory holding this operator's runs; removed on close or drop.
    run_dir: Option<TempDir>,
    /// Reader over the fully merged run. `None` with `sorted` set means
    /// the input was empty or the operator was closed.
    output: Option<PageReader>,
    sorted: bool,
}

pub type ExternalSortOperator = Lookahead<ExternalSort>;

impl ExternalSortOperator {
    pub fn new(
        input: Box<dyn PhysicalOperator>,
        order_by: &[ColumnRef],
        buffer_pages: usize,
        ctx: &ExecContext,
    ) -> MinirelResult<Self> {
        let keys = resolve_sort_keys(input.header(), order_by)?;
        Self::with_keys(input, keys, buffer_pages, ctx)
    }

    pub fn with_keys(
        input: Box<dyn PhysicalOperator>,
        keys: SortKeys,
        buffer_pages: usize,
        ctx: &ExecContext,
    ) -> MinirelResult<Self> {
        if buffer_pages < 3 {
            return Err(MinirelError::InvalidBufferSize {
                operator: "external sort",
                minimum: 3,
                actual: buffer_pages,
            });
        }
        check_sort_keys(input.header(), &keys)?;
        let header = input.header().clone();
        Ok(Lookahead::wrap(ExternalSort {
            input: BlockCache::new(input, buffer_pages),
            header,
            keys,
            buffer_pages,
            temp_root: ctx.config().temp_dir(),
            stats: ctx.stats(),
            run_dir: None,
            output: None,
            sorted: false,
        }))
    }
}

impl ExternalSort {
    /// Path of the directory holding runs, once sorting has started.
    pub fn run_dir(&self) -> Option<&Path> {
        self.run_dir.as_ref().map(|dir| dir.path())
    }

    fn run_path(dir: &Path, pass: usize, index: usize) -> PathBuf {
        dir.join(format!("pass{}-run{}", pass, index))
    }

    fn delete_run(&self, path: &Path) -> MinirelResult<()> {
        std::fs::remove_file(path)?;
        self.stats.record_run_deleted();
        Ok(())
    }

    /// Pass 0: one sorted run per block of input.
    fn create_initial_runs(&mut self, dir: &Path) -> MinirelResult<Vec<PathBuf>> {
        let width = self.header.len();
        let mut runs = Vec::new();
        while self.input.load_next_block()? {
            let mut block = self.input.take_block();
            let keys = &self.keys;
            block.sort_by(|a, b| compare_on_keys(keys, a, b));

            let path = Self::run_path(dir, 0, runs.len());
            let mut writer = PageWriter::create(&path, width, Arc::clone(&self.stats))?;
            self.stats.record_run_created();
            for tuple in &block {
                writer.write(tuple)?;
            }
            writer.finish()?;
            runs.push(path);
        }
        Ok(runs)
    }

    /// Merge `inputs` into a single run at `output` with a linear scan for
    /// the smallest head.
    fn merge_runs(&self, inputs: &[PathBuf], output: &Path) -> MinirelResult<()> {
        let mut readers = inputs
            .iter()
            .map(|path| PageReader::open(path, Arc::clone(&self.stats)))
            .collect::<MinirelResult<Vec<_>>>()?;
        let mut heads = Vec::with_capacity(readers.len());
        for reader in readers.iter_mut() {
            heads.push(reader.next_tuple()?);
        }

        let mut writer = PageWriter::create(output, self.header.len(), Arc::clone(&self.stats))?;
        self.stats.record_run_created();
        loop {
            let mut smallest: Option<usize> = None;
            for (i, head) in heads.iter().enumerate() {
                let Some(candidate) = head else { continue };
                let better = match smallest.and_then(|s| heads[s].as_ref()) {
                    Some(current) => {
                        compare_on_keys(&self.keys, candidate, current) == Ordering::Less
                    }
                    None => true,
                };
                if better {
                    smallest = Some(i);
                }
            }
            let Some(i) = smallest else { break };
            if let Some(tuple) = heads[i].take() {
                writer.write(&tuple)?;
            }
            heads[i] = readers[i].next_tuple()?;
        }
        writer.finish()?;

        for reader in readers.iter_mut() {
            reader.close();
        }
        Ok(())
    }

    /// Run every pass and open the final run for reading.
    fn materialize(&mut self) -> MinirelResult<()> {
        if self.sorted {
            return Ok(());
        }
        self.sorted = true;

        let dir = tempfile::Builder::new()
            .prefix("minirel-sort-")
            .tempdir_in(&self.temp_root)?;
        let dir_path = dir.path().to_path_buf();
        self.run_dir = Some(dir);

        let mut runs = self.create_initial_runs(&dir_path)?;
        debug!(runs = runs.len(), buffer_pages = self.buffer_pages, "external sort pass 0 complete");

        let fan_in = self.buffer_pages - 1;
        let mut pass = 1;
        while runs.len() > 1 {
            let mut merged = Vec::with_capacity(runs.len().div_ceil(fan_in));
            for group in runs.chunks(fan_in) {
                if let [single] = group {
                    merged.push(single.clone());
                    continue;
                }
                let output = Self::run_path(&dir_path, pass, merged.len());
                self.merge_runs(group, &output)?;
                for run in group {
                    self.delete_run(run)?;
                }
                merged.push(output);
            }
            debug!(pass, runs = merged.len(), "external sort merge pass complete");
            runs = merged;
            pass += 1;
        }

        if let Some(last) = runs.first() {
            self.output = Some(PageReader::open(last, Arc::clone(&self.stats))?);
        }
        Ok(())
    }

    /// Close the final reader and remove the run directory.
    fn cleanup(&mut self) {
        if let Some(mut reader) = self.output.take() {
            reader.close();
            self.stats.record_run_deleted();
        }
        if let Some(dir) = self.run_dir.take() {
            if let Err(err) = dir.close() {
                debug!(error = %err, "failed to remove sort run directory");
            }
        }
    }
}

impl TupleSource for ExternalSort {
    fn header(&self) -> &Header {
        &self.header
    }

    fn fetch(&mut self) -> MinirelResult<Option<Tuple>> {
        self.materialize()?;
        match self.output.as_mut() {
            Some(reader) => reader.next_tuple(),
            None => Ok(None),
        }
    }

    fn rewind(&mut self) -> MinirelResult<bool> {
        if let Some(reader) = self.output.as_mut() {
            reader.reset()?;
        }
        Ok(true)
    }

    fn release(&mut self) {
        self.sorted = true;
        self.cleanup();
        self.input.close();
    }

    fn name(&self) -> &'static str {
        "ExternalSort"
    }
}

impl SeekableSource for ExternalSort {
    fn seek(&mut self, index: usize) -> MinirelResult<bool> {
        self.materialize()?;
        if let Some(reader) = self.output.as_mut() {
            reader.seek_index(index)?;
        }
        Ok(true)
    }

    fn ordering(&self) -> &[usize] {
        &self.keys
    }
}

impl Drop for ExternalSort {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecConfig;
    use crate::sql::executor::collect_all;
    use crate::sql::executor::operators::{MemoryScanOperator, SortedOperator};

    fn context(dir: &Path) -> ExecContext {
        ExecContext::new(ExecConfig::default().with_temp_dir(dir))
    }

    /// Pseudo-random but deterministic values.
    fn shuffled(n: i32) -> Vec<Tuple> {
        (0..n)
            .map(|i| Tuple::new(vec![(i * 7919) % n, i]))
            .collect()
    }

    fn scan(data: Vec<Tuple>) -> Box<dyn PhysicalOperator> {
        Box::new(MemoryScanOperator::from_tuples(
            Header::for_table("T", &["A", "B"]),
            data,
        ))
    }

    #[test]
    fn test_rejects_small_buffer() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path());
        let result = ExternalSortOperator::with_keys(scan(vec![]), SortKeys::from_slice(&[0]), 2, &ctx);
        assert!(matches!(
            result,
            Err(MinirelError::InvalidBufferSize { minimum: 3, actual: 2, .. })
        ));
    }

    #[test]
    fn test_multi_pass_sort_and_cleanup() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path());
        // width 2 → 511 tuples per page, 3 pages per pass-0 run
        let n = 10_000;
        let mut sort =
            ExternalSortOperator::with_keys(scan(shuffled(n)), SortKeys::from_slice(&[0]), 3, &ctx)
                .unwrap();
        let out = collect_all(&mut sort).unwrap();
        assert_eq!(out.len(), n as usize);
        assert!(out.windows(2).all(|w| w[0].get(0) <= w[1].get(0)));

        let snapshot = ctx.io_snapshot();
        // 10000 / 1533 → 7 initial runs; merging two at a time writes 3, 2, 1
        // new runs (a lone leftover run is carried to the next pass as is)
        assert_eq!(snapshot.runs_created, 7 + 3 + 2 + 1);
        assert_eq!(snapshot.live_runs(), 1);

        let run_dir = sort.source().run_dir().unwrap().to_path_buf();
        sort.close();
        assert_eq!(ctx.io_snapshot().live_runs(), 0);
        assert!(!run_dir.exists());
    }

    #[test]
    fn test_reset_to_and_reset() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path());
        let mut sort =
            ExternalSortOperator::with_keys(scan(shuffled(3000)), SortKeys::from_slice(&[0]), 3, &ctx)
                .unwrap();
        assert!(sort.reset_to(1500).unwrap());
        assert_eq!(sort.next().unwrap().unwrap().get(0), 1500);
        assert_eq!(sort.last_index(), Some(1500));
        assert!(sort.reset().unwrap());
        assert_eq!(sort.next().unwrap().unwrap().get(0), 0);
    }

    #[test]
    fn test_empty_input() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path());
        let mut sort =
            ExternalSortOperator::with_keys(scan(vec![]), SortKeys::from_slice(&[1]), 4, &ctx).unwrap();
        assert!(collect_all(&mut sort).unwrap().is_empty());
        assert_eq!(ctx.io_snapshot().runs_created, 0);
    }
}
