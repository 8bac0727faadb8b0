// ==========================================
// 机台生产排程 - 需求队列
// ==========================================
// 职责: 把机台的订单产品构建为按优先级排序的作业队列
// 结构: 预排序的定长数组 + 游标，作业排完即推进游标，不做删除
// 红线: 日产能 <= 0 的作业在分配前拒绝
// ==========================================

use tracing::debug;

use crate::domain::order::OrderProduct;
use crate::domain::schedule::Job;
use crate::engine::error::{EngineError, EngineResult};

#[derive(Debug, Clone)]
pub struct DemandQueue {
    jobs: Vec<Job>,
    cursor: usize,
}

impl DemandQueue {
    /// 构建需求队列
    ///
    /// # 参数
    /// - `machine_no`: 机台号（用于错误信息）
    /// - `products`: 订单产品（调用方声明的顺序）
    ///
    /// # 返回
    /// - Ok(DemandQueue): 按 sort_order 升序排列（相同 sort_order 保持输入顺序）
    /// - Err(EmptyDemand): 输入为空
    /// - Err(InvalidCapacity): 存在日产能 <= 0 的产品
    /// - Err(InvalidQuantity): 存在订单数量 < 0 的产品
    pub fn build(machine_no: &str, products: &[OrderProduct]) -> EngineResult<Self> {
        if products.is_empty() {
            return Err(EngineError::EmptyDemand {
                machine_no: machine_no.to_string(),
            });
        }

        for product in products {
            if product.daily_capacity <= 0 {
                return Err(EngineError::InvalidCapacity {
                    product_code: product.product_code.clone(),
                    product_name: product.product_name.clone(),
                    daily_capacity: product.daily_capacity,
                });
            }
            if product.order_quantity < 0 {
                return Err(EngineError::InvalidQuantity {
                    product_code: product.product_code.clone(),
                    product_name: product.product_name.clone(),
                    order_quantity: product.order_quantity,
                });
            }
        }

        let mut jobs: Vec<Job> = products.iter().map(Job::from_product).collect();
        // sort_by_key 是稳定排序
        jobs.sort_by_key(|job| job.sort_order);

        debug!(
            machine_no = %machine_no,
            jobs_count = jobs.len(),
            "需求队列已构建"
        );

        Ok(Self { jobs, cursor: 0 })
    }

    /// 队列中的全部作业（含已排完的）
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// 作业数量
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// 当前队首作业（剩余数量 > 0 的最高优先级作业）
    ///
    /// 订单数量为 0 的作业在此被直接跳过
    pub fn current(&mut self) -> Option<&mut Job> {
        while self
            .jobs
            .get(self.cursor)
            .map_or(false, |job| job.is_satisfied())
        {
            self.cursor += 1;
        }
        self.jobs.get_mut(self.cursor)
    }

    /// 是否所有作业都已排完
    pub fn is_exhausted(&self) -> bool {
        self.jobs[self.cursor..].iter().all(|job| job.is_satisfied())
    }

    /// 排完全部作业所需的工作日数（超出 i64 范围时取 i64::MAX）
    pub fn required_days(&self) -> i64 {
        self.jobs
            .iter()
            .fold(0i64, |total, job| total.saturating_add(job.required_days()))
    }

    /// 取出作业（分配结束后查看最终剩余数量）
    pub fn into_jobs(self) -> Vec<Job> {
        self.jobs
    }
}
