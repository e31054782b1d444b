use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A row that can live in a [`Table`]. Ids are assigned by the table on insert.
pub trait Record: Clone + Serialize + DeserializeOwned {
    fn id(&self) -> u64;
    fn set_id(&mut self, id: u64);
}

#[derive(Debug, Deserialize)]
struct TableFile<R> {
    next_id: u64,
    rows: Vec<R>,
}

#[derive(Serialize)]
struct TableFileRef<'a, R> {
    next_id: u64,
    rows: &'a [R],
}

/// JSON-file backed table.
///
/// Every mutation is applied to a copy of the rows, written to a temp file and
/// renamed over the table file. Memory is only updated once the rename
/// succeeded, so a failed write leaves the table exactly as it was.
pub struct Table<R> {
    file_path: PathBuf,
    next_id: u64,
    rows: Vec<R>,
}

impl<R: Record> Table<R> {
    pub fn load_or_create(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let (next_id, rows) = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let file: TableFile<R> = serde_json::from_str(&content)?;
            (file.next_id, file.rows)
        } else {
            (1, Vec::new())
        };

        Ok(Table {
            file_path: path.to_path_buf(),
            next_id,
            rows,
        })
    }

    fn persist(&self, next_id: u64, rows: &[R]) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(&TableFileRef { next_id, rows })?;
        let temp_path = self.file_path.with_extension("tmp");
        std::fs::write(&temp_path, content)?;
        std::fs::rename(&temp_path, &self.file_path)?;
        Ok(())
    }

    fn commit(&mut self, next_id: u64, rows: Vec<R>) -> anyhow::Result<()> {
        self.persist(next_id, &rows)?;
        self.next_id = next_id;
        self.rows = rows;
        Ok(())
    }

    pub fn get(&self, id: u64) -> Option<&R> {
        self.rows.iter().find(|r| r.id() == id)
    }

    pub fn find<P>(&self, pred: P) -> Option<&R>
    where
        P: Fn(&R) -> bool,
    {
        self.rows.iter().find(|&r| pred(r))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }

    /// Row with the highest id.
    pub fn last(&self) -> Option<&R> {
        self.rows.iter().max_by_key(|r| r.id())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn insert(&mut self, mut row: R) -> anyhow::Result<R> {
        row.set_id(self.next_id);
        let mut rows = self.rows.clone();
        rows.push(row.clone());
        self.commit(self.next_id + 1, rows)?;
        Ok(row)
    }

    /// Applies `f` to the row with `id`. Returns `None` without writing when it
    /// does not exist.
    pub fn update<F>(&mut self, id: u64, f: F) -> anyhow::Result<Option<R>>
    where
        F: FnOnce(&mut R),
    {
        let mut rows = self.rows.clone();
        let Some(row) = rows.iter_mut().find(|r| r.id() == id) else {
            return Ok(None);
        };
        f(row);
        let updated = row.clone();
        self.commit(self.next_id, rows)?;
        Ok(Some(updated))
    }

    /// Applies `f` to every row matching `pred`, returns how many matched.
    pub fn update_where<P, F>(&mut self, pred: P, f: F) -> anyhow::Result<usize>
    where
        P: Fn(&R) -> bool,
        F: Fn(&mut R),
    {
        let mut rows = self.rows.clone();
        let mut changed = 0;
        for row in rows.iter_mut().filter(|r| pred(&**r)) {
            f(row);
            changed += 1;
        }
        if changed > 0 {
            self.commit(self.next_id, rows)?;
        }
        Ok(changed)
    }

    /// Applies `f` to the first row matching `pred`, inserting `default()` first
    /// if nothing matches. Both steps land in a single commit.
    pub fn upsert<P, D, F>(&mut self, pred: P, default: D, f: F) -> anyhow::Result<R>
    where
        P: Fn(&R) -> bool,
        D: FnOnce() -> R,
        F: FnOnce(&mut R),
    {
        let mut rows = self.rows.clone();
        let mut next_id = self.next_id;
        let index = match rows.iter().position(|r| pred(r)) {
            Some(index) => index,
            None => {
                let mut row = default();
                row.set_id(next_id);
                next_id += 1;
                rows.push(row);
                rows.len() - 1
            }
        };
        f(&mut rows[index]);
        let row = rows[index].clone();
        self.commit(next_id, rows)?;
        Ok(row)
    }

    pub fn remove(&mut self, id: u64) -> anyhow::Result<Option<R>> {
        let Some(index) = self.rows.iter().position(|r| r.id() == id) else {
            return Ok(None);
        };
        let mut rows = self.rows.clone();
        let removed = rows.remove(index);
        self.commit(self.next_id, rows)?;
        Ok(Some(removed))
    }

    /// Keeps only rows matching `keep`, returns how many were dropped.
    pub fn retain<P>(&mut self, keep: P) -> anyhow::Result<usize>
    where
        P: Fn(&R) -> bool,
    {
        let rows: Vec<R> = self.rows.iter().filter(|&r| keep(r)).cloned().collect();
        let removed = self.rows.len() - rows.len();
        if removed > 0 {
            self.commit(self.next_id, rows)?;
        }
        Ok(removed)
    }
}
