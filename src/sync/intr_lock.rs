//! 关中断自旋锁。
//!
//! `acquire` 清掉全局中断使能位，`release` 无条件置位。
//! 不可重入、不计数：嵌套使用时内层的 `release` 会直接把
//! 中断打开，外层的临界区随之失效，调用方必须避免嵌套。
//! 没有排队也没有阻塞——持锁任务只是不可被抢占而已。
//!
//! 仅在单 hart 前提下成立：关掉本核的中断并不能阻止别的核
//! 同时改共享状态。

use crate::hal::Machine;

pub struct IntrLock<M: Machine> {
    machine: M,
}

impl<M: Machine> IntrLock<M> {
    pub const fn new(machine: M) -> Self {
        Self { machine }
    }

    /// 进入临界区：此后任何异步中断都无法抢占当前任务，
    /// 同步异常仍然可能发生
    pub fn acquire(&self) {
        self.machine.set_interrupt_enable(false);
    }

    /// 离开临界区：无条件重新开中断（set，不是 restore）
    pub fn release(&self) {
        self.machine.set_interrupt_enable(true);
    }
}
