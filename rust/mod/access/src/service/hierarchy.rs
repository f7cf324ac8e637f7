use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::debug;

use bizscope_sql::{SQLStore, Value};

use crate::model::{CompanyId, UserId};
use crate::service::AccessError;

/// Resolves the users that report to a user, transitively, inside one company.
pub trait HierarchyLookup: Send + Sync {
    /// Subordinates of `user` in `company`. Never contains `user` itself.
    fn subordinate_ids(
        &self,
        user: UserId,
        company: CompanyId,
    ) -> Result<BTreeSet<UserId>, AccessError>;
}

/// Depth-first walk from `root` over `children`. The visited set makes
/// cycles in the reporting data terminate.
fn collect_descendants<F>(root: UserId, mut children: F) -> Result<BTreeSet<UserId>, AccessError>
where
    F: FnMut(UserId) -> Result<Vec<UserId>, AccessError>,
{
    let mut found = BTreeSet::new();
    let mut stack = vec![root];
    while let Some(parent) = stack.pop() {
        for child in children(parent)? {
            if found.insert(child) {
                stack.push(child);
            }
        }
    }
    found.remove(&root);
    Ok(found)
}

struct CacheEntry {
    ids: BTreeSet<UserId>,
    inserted_at: Instant,
}

/// TTL cache of subordinate sets per (user, company).
///
/// A poisoned lock behaves like an empty cache.
pub struct SubordinateCache {
    ttl: Duration,
    entries: RwLock<HashMap<(UserId, CompanyId), CacheEntry>>,
}

impl SubordinateCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_secs),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// An expired entry is removed on the lookup that finds it.
    pub fn get(&self, user: UserId, company: CompanyId) -> Option<BTreeSet<UserId>> {
        let key = (user, company);
        {
            let entries = self.entries.read().ok()?;
            let entry = entries.get(&key)?;
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.ids.clone());
            }
        }
        if let Ok(mut entries) = self.entries.write() {
            if entries
                .get(&key)
                .is_some_and(|e| e.inserted_at.elapsed() >= self.ttl)
            {
                entries.remove(&key);
            }
        }
        None
    }

    /// Expired entries are swept before the new one goes in.
    pub fn set(&self, user: UserId, company: CompanyId, ids: BTreeSet<UserId>) {
        if let Ok(mut entries) = self.entries.write() {
            let ttl = self.ttl;
            entries.retain(|_, e| e.inserted_at.elapsed() < ttl);
            entries.insert(
                (user, company),
                CacheEntry {
                    ids,
                    inserted_at: Instant::now(),
                },
            );
        }
    }

    /// Drop every entry of a user, across companies.
    pub fn invalidate(&self, user: UserId) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|(u, _), _| *u != user);
        }
    }

    pub fn invalidate_all(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

/// Hierarchy stored in `company_users`: a user's direct reports in a company
/// are the members whose row in that company they created.
pub struct SqlHierarchy {
    sql: Arc<dyn SQLStore>,
    cache: SubordinateCache,
}

impl SqlHierarchy {
    pub fn new(sql: Arc<dyn SQLStore>, cache_ttl_secs: u64) -> Self {
        Self {
            sql,
            cache: SubordinateCache::new(cache_ttl_secs),
        }
    }

    fn direct_reports(&self, user: UserId, company: CompanyId) -> Result<Vec<UserId>, AccessError> {
        let rows = self.sql.query(
            "SELECT user_id FROM company_users WHERE created_by = ?1 AND company_id = ?2",
            &[Value::Integer(user), Value::Integer(company)],
        )?;
        Ok(rows.iter().filter_map(|r| r.get_i64("user_id")).collect())
    }

    /// Record that `user` belongs to `company`, added by `created_by`.
    ///
    /// Every cached set may now be stale, so the whole cache is dropped.
    pub fn add_membership(
        &self,
        user: UserId,
        company: CompanyId,
        created_by: Option<UserId>,
    ) -> Result<(), AccessError> {
        self.sql.exec(
            "INSERT INTO company_users (user_id, company_id, created_by) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, company_id) DO UPDATE SET created_by = excluded.created_by",
            &[Value::Integer(user), Value::Integer(company), created_by.into()],
        )?;
        self.cache.invalidate_all();
        Ok(())
    }

    /// Whether `user` has a row in `company`.
    pub fn is_member(&self, user: UserId, company: CompanyId) -> Result<bool, AccessError> {
        let rows = self.sql.query(
            "SELECT 1 AS ok FROM company_users WHERE user_id = ?1 AND company_id = ?2",
            &[Value::Integer(user), Value::Integer(company)],
        )?;
        Ok(!rows.is_empty())
    }

    pub fn remove_membership(&self, user: UserId, company: CompanyId) -> Result<bool, AccessError> {
        let n = self.sql.exec(
            "DELETE FROM company_users WHERE user_id = ?1 AND company_id = ?2",
            &[Value::Integer(user), Value::Integer(company)],
        )?;
        self.cache.invalidate_all();
        Ok(n > 0)
    }

    pub fn invalidate(&self, user: UserId) {
        self.cache.invalidate(user);
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

impl HierarchyLookup for SqlHierarchy {
    fn subordinate_ids(
        &self,
        user: UserId,
        company: CompanyId,
    ) -> Result<BTreeSet<UserId>, AccessError> {
        if let Some(cached) = self.cache.get(user, company) {
            return Ok(cached);
        }
        let ids = collect_descendants(user, |parent| self.direct_reports(parent, company))?;
        debug!(user, company, count = ids.len(), "expanded subordinates");
        self.cache.set(user, company, ids.clone());
        Ok(ids)
    }
}

/// In-memory hierarchy, for callers that already hold the reporting lines.
#[derive(Debug, Clone, Default)]
pub struct OrgChart {
    reports: BTreeMap<(CompanyId, UserId), Vec<UserId>>,
}

impl OrgChart {
    pub fn new() -> Self {
        Self::default()
    }

    /// `user` was added to `company` by `manager`.
    pub fn report(mut self, company: CompanyId, manager: UserId, user: UserId) -> Self {
        self.reports.entry((company, manager)).or_default().push(user);
        self
    }
}

impl HierarchyLookup for OrgChart {
    fn subordinate_ids(
        &self,
        user: UserId,
        company: CompanyId,
    ) -> Result<BTreeSet<UserId>, AccessError> {
        collect_descendants(user, |parent| {
            Ok(self.reports.get(&(company, parent)).cloned().unwrap_or_default())
        })
    }
}
