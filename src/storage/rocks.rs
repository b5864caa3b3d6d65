use super::{
    FacetAccumulator, InventoryStore, Result, StorageError, collect_page,
};
use crate::listing::Listing;
use crate::query::{Facet, ListingPredicate, SortKey};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use log::info;
use rocksdb::{
    BlockBasedOptions, ColumnFamilyDescriptor, DBCompactionStyle, DBCompressionType,
    DBWithThreadMode, Direction, IteratorMode, MultiThreaded, Options, WriteBatch,
};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::task::spawn_blocking;
use tokio_stream::wrappers::ReceiverStream;

const LISTINGS_CF: &str = "listings";
const SAVED_CF: &str = "saved";
const COLUMN_FAMILIES: &[&str] = &[LISTINGS_CF, SAVED_CF];

/// Separates the user id from the listing id in saved-list keys.
const KEY_SEPARATOR: char = '\u{1f}';

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: String,
    pub write_buffer_size_mb: usize,
    pub max_write_buffer_number: i32,
    pub max_background_jobs: i32,
    pub parallelism: i32,
}

impl Config {
    pub fn at(data_dir: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            max_background_jobs: 2,
            parallelism: 2,
        }
    }
}

/// Inventory persisted in RocksDB. Listings are MessagePack rows keyed by id.
pub struct RocksStorage {
    inner: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Serialises saved-list toggles, which read before they write.
    saved_lock: Arc<Mutex<()>>,
}

impl RocksStorage {
    pub fn open(cfg: &Config) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        opts.set_write_buffer_size(cfg.write_buffer_size_mb * 1024 * 1024);
        opts.set_max_write_buffer_number(cfg.max_write_buffer_number);
        opts.set_max_background_jobs(cfg.max_background_jobs);
        opts.set_compaction_style(DBCompactionStyle::Level);
        opts.increase_parallelism(cfg.parallelism);
        opts.set_compression_type(DBCompressionType::Zstd);

        let mut block_opts = BlockBasedOptions::default();
        block_opts.set_block_size(16 * 1024);
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect::<Vec<_>>();

        let db: DBWithThreadMode<MultiThreaded> =
            DBWithThreadMode::open_cf_descriptors(&opts, &cfg.data_dir, descriptors)?;

        info!("Opened inventory store at {}", cfg.data_dir);

        Ok(Self {
            inner: Arc::new(db),
            saved_lock: Arc::new(Mutex::new(())),
        })
    }

    async fn fold_available(&self, facet: Option<Facet>) -> Result<FacetAccumulator> {
        let mut stream = self.scan_listings().await?;
        let mut acc = FacetAccumulator::default();

        while let Some(listing) = stream.next().await {
            acc.observe(facet, &listing?);
        }

        Ok(acc)
    }
}

/// Ids holding the separator are rejected: they would read as another
/// user's prefix.
fn saved_key(user_id: &str, listing_id: &str) -> Result<String> {
    for id in [user_id, listing_id] {
        if id.contains(KEY_SEPARATOR) {
            return Err(StorageError::InvalidKey(id.to_string()));
        }
    }
    Ok(format!("{user_id}{KEY_SEPARATOR}{listing_id}"))
}

fn parse_listing(data: &[u8]) -> Result<Listing> {
    let listing = rmp_serde::from_slice(data).map_err(StorageError::InvalidRecord)?;
    Ok(listing)
}

#[async_trait]
impl InventoryStore for RocksStorage {
    async fn find_available_listings(
        &self,
        predicate: &ListingPredicate,
        sort: SortKey,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Listing>, u64)> {
        let stream = self.scan_listings().await?;
        collect_page(stream, predicate, sort, offset, limit).await
    }

    async fn distinct_values(&self, facet: Facet) -> Result<BTreeSet<String>> {
        Ok(self.fold_available(Some(facet)).await?.into_values())
    }

    async fn price_bounds(&self) -> Result<Option<(Decimal, Decimal)>> {
        Ok(self.fold_available(None).await?.bounds())
    }

    async fn get_listing(&self, id: &str) -> Result<Option<Listing>> {
        let db = self.inner.clone();
        let id = id.to_string();

        spawn_blocking(move || {
            let cf = db
                .cf_handle(LISTINGS_CF)
                .ok_or_else(|| StorageError::MissingColumnFamily(LISTINGS_CF.to_string()))?;

            match db.get_cf(&cf, id)? {
                Some(val) => Ok(Some(parse_listing(val.as_slice())?)),
                None => Ok(None),
            }
        })
        .await?
    }

    async fn put_listing(&self, listing: &Listing) -> Result<()> {
        self.put_batch(std::slice::from_ref(listing)).await
    }

    async fn put_batch(&self, listings: &[Listing]) -> Result<()> {
        let db = self.inner.clone();
        let rows: Vec<(String, Vec<u8>)> = listings
            .iter()
            .map(|l| Ok((l.id.clone(), rmp_serde::to_vec_named(l)?)))
            .collect::<Result<_>>()?;

        spawn_blocking(move || {
            let cf = db
                .cf_handle(LISTINGS_CF)
                .ok_or_else(|| StorageError::MissingColumnFamily(LISTINGS_CF.to_string()))?;

            let mut batch = WriteBatch::default();
            for (key, row) in rows {
                batch.put_cf(&cf, key, row);
            }

            db.write(batch)?;
            Ok(())
        })
        .await?
    }

    async fn delete_listing(&self, id: &str) -> Result<bool> {
        let db = self.inner.clone();
        let id = id.to_string();

        spawn_blocking(move || {
            let cf = db
                .cf_handle(LISTINGS_CF)
                .ok_or_else(|| StorageError::MissingColumnFamily(LISTINGS_CF.to_string()))?;

            if db.get_pinned_cf(&cf, &id)?.is_none() {
                return Ok(false);
            }

            db.delete_cf(&cf, id)?;
            Ok(true)
        })
        .await?
    }

    async fn scan_listings(&self) -> Result<ReceiverStream<Result<Listing>>> {
        let db = self.inner.clone();
        let (tx, rx) = mpsc::channel(64);

        spawn_blocking(move || {
            let Some(cf) = db.cf_handle(LISTINGS_CF) else {
                let missing = StorageError::MissingColumnFamily(LISTINGS_CF.to_string());
                let _ = tx.blocking_send(Err(missing));
                return;
            };

            for res in db.iterator_cf(&cf, IteratorMode::Start) {
                let listing = res
                    .map_err(StorageError::BackendError)
                    .and_then(|(_, v)| parse_listing(v.as_ref()));

                if tx.blocking_send(listing).is_err() {
                    break;
                }
            }
        });

        Ok(ReceiverStream::new(rx))
    }

    async fn saved_listing_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let db = self.inner.clone();
        let prefix = saved_key(user_id, "")?;

        let mut entries: Vec<(String, DateTime<Utc>)> = spawn_blocking(move || {
            let cf = db
                .cf_handle(SAVED_CF)
                .ok_or_else(|| StorageError::MissingColumnFamily(SAVED_CF.to_string()))?;

            let mut entries = Vec::new();
            let mode = IteratorMode::From(prefix.as_bytes(), Direction::Forward);
            for res in db.iterator_cf(&cf, mode) {
                let (key, value) = res?;
                let Some(listing_id) = key.strip_prefix(prefix.as_bytes()) else {
                    break;
                };

                let listing_id = String::from_utf8_lossy(listing_id).into_owned();
                let saved_at: DateTime<Utc> = rmp_serde::from_slice(&value)?;
                entries.push((listing_id, saved_at));
            }

            Ok::<_, StorageError>(entries)
        })
        .await??;

        entries.sort_by(|(a_id, a_at), (b_id, b_at)| b_at.cmp(a_at).then_with(|| a_id.cmp(b_id)));
        Ok(entries.into_iter().map(|(id, _)| id).collect())
    }

    async fn toggle_saved(&self, user_id: &str, listing_id: &str) -> Result<bool> {
        let db = self.inner.clone();
        let lock = self.saved_lock.clone();
        let key = saved_key(user_id, listing_id)?;
        let saved_at = rmp_serde::to_vec(&Utc::now())?;

        spawn_blocking(move || {
            let cf = db
                .cf_handle(SAVED_CF)
                .ok_or_else(|| StorageError::MissingColumnFamily(SAVED_CF.to_string()))?;

            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            if db.get_pinned_cf(&cf, &key)?.is_some() {
                db.delete_cf(&cf, key)?;
                Ok(false)
            } else {
                db.put_cf(&cf, key, saved_at)?;
                Ok(true)
            }
        })
        .await?
    }
}
