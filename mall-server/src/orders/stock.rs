//! Stock Manager - 按商品串行化的库存仲裁
//!
//! 每个商品一个 [`StockSlot`]，槽内数量由 `tokio::sync::Mutex` 保护：
//! 持有锁的调用方是该商品库存在此刻的唯一持有者，check-and-set 不会
//! 与任何其他 Deduct/Restore 并发执行。
//!
//! # Consistency model
//!
//! 内存槽位是准入判断的权威值；数据库里的 `product.stock` 只是异步
//! 写回的快照。写回按槽位内分配的序号门控，乱序到达的旧快照直接
//! 丢弃，不会覆盖更新的值。进程重启后槽位在首次访问时重新从数据库
//! 播种。
//! 在一次成功的内存扣减与其落库之间崩溃会丢失该次调整，这是两阶段
//! 设计的已知窗口（见 DESIGN.md）。
//!
//! # Slot lifetime
//!
//! 槽位按首次访问惰性创建，进程存续期间不过期、不淘汰。淘汰一个还有
//! 在途异步写回的槽位会使权威值与快照脱节，因此这里选择常驻并把商品
//! 基数作为容量预算记录在案。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::core::{OrderError, OrderResult};
use crate::db::repository::product;

/// 单个商品的库存槽位
///
/// 锁内的 `i64` 即当前可用量；持有锁守卫期间没有任何其他任务能读或
/// 改这个数量。
#[derive(Debug)]
pub struct StockSlot {
    product_id: i64,
    quantity: Mutex<i64>,
    /// 快照序号，在数量锁内分配，序号顺序即数值新旧顺序
    write_seq: AtomicU64,
    /// 已落库的最高序号，写回任务在此串行
    persisted_seq: Mutex<u64>,
}

/// 商品 → 槽位映射的属主
///
/// 槽位创建用一把短临界区锁串行化，两个并发的首次访问会合流到同一个
/// 槽位上（不会重复播种）。已存在槽位的查找走 DashMap 无锁读路径。
pub struct StockManager {
    pool: SqlitePool,
    slots: DashMap<i64, Arc<StockSlot>>,
    init_lock: Mutex<()>,
}

impl StockManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            slots: DashMap::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// 获取或初始化商品槽位
    ///
    /// 首次访问时从数据库读一次当前库存作为种子。
    async fn slot(&self, product_id: i64) -> OrderResult<Arc<StockSlot>> {
        if let Some(slot) = self.slots.get(&product_id) {
            return Ok(slot.clone());
        }

        let _guard = self.init_lock.lock().await;
        // Double-check: another task may have seeded it while we waited
        if let Some(slot) = self.slots.get(&product_id) {
            return Ok(slot.clone());
        }

        let stock = product::read_stock(&self.pool, product_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(format!("product {product_id} not found")))?;

        let slot = Arc::new(StockSlot {
            product_id,
            quantity: Mutex::new(stock),
            write_seq: AtomicU64::new(0),
            persisted_seq: Mutex::new(0),
        });
        self.slots.insert(product_id, slot.clone());
        tracing::debug!(product_id, seeded = stock, "Stock slot initialized");
        Ok(slot)
    }

    /// 扣减库存
    ///
    /// 持有槽位锁完成 check-and-set：不足则原值放回并返回
    /// [`OrderError::InsufficientStock`]（携带当前可用量与需求量），
    /// 足够则写入扣减后的值并异步落库。结果为负的扣减一律拒绝，
    /// 从不截断。
    pub async fn deduct(&self, product_id: i64, quantity: i64) -> OrderResult<()> {
        if quantity <= 0 {
            return Err(OrderError::Validation(format!(
                "deduct quantity must be positive, got {quantity}"
            )));
        }

        let slot = self.slot(product_id).await?;
        let mut current = slot.quantity.lock().await;

        if *current < quantity {
            return Err(OrderError::InsufficientStock {
                product_id,
                available: *current,
                requested: quantity,
            });
        }

        *current -= quantity;
        let new_stock = *current;
        let seq = slot.write_seq.fetch_add(1, Ordering::SeqCst) + 1;
        drop(current);

        tracing::debug!(product_id = slot.product_id, quantity, new_stock, "Stock deducted");
        self.persist(slot, seq, new_stock);
        Ok(())
    }

    /// 恢复库存（取消订单、创建失败补偿时调用）
    pub async fn restore(&self, product_id: i64, quantity: i64) -> OrderResult<()> {
        if quantity < 0 {
            return Err(OrderError::Validation(format!(
                "restore quantity must be non-negative, got {quantity}"
            )));
        }

        let slot = self.slot(product_id).await?;
        let mut current = slot.quantity.lock().await;
        *current += quantity;
        let new_stock = *current;
        let seq = slot.write_seq.fetch_add(1, Ordering::SeqCst) + 1;
        drop(current);

        tracing::debug!(product_id, quantity, new_stock, "Stock restored");
        self.persist(slot, seq, new_stock);
        Ok(())
    }

    /// 读取当前可用量（诊断与测试用，参与同一把槽位锁）
    pub async fn available(&self, product_id: i64) -> OrderResult<i64> {
        let slot = self.slot(product_id).await?;
        let current = slot.quantity.lock().await;
        Ok(*current)
    }

    /// 异步写回数据库快照，失败只记录日志。
    ///
    /// 写回任务在槽位的 `persisted_seq` 上串行；序号不高于已落库值
    /// 的快照说明更新的值已先行落库，直接丢弃。
    fn persist(&self, slot: Arc<StockSlot>, seq: u64, new_stock: i64) {
        let pool = self.pool.clone();
        tokio::spawn(async move {
            let mut persisted = slot.persisted_seq.lock().await;
            if seq <= *persisted {
                return;
            }
            match product::write_stock(&pool, slot.product_id, new_stock).await {
                Ok(()) => *persisted = seq,
                Err(e) => {
                    tracing::warn!(
                        product_id = slot.product_id,
                        new_stock,
                        error = %e,
                        "Failed to persist stock snapshot"
                    );
                }
            }
        });
    }
}

impl std::fmt::Debug for StockManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockManager")
            .field("slots", &self.slots.len())
            .finish()
    }
}
