//! 平台级中断控制器（PLIC）。
//!
//! 外部设备的中断线汇到 PLIC，内核通过 claim/complete 握手
//! 逐个领取并归还：claim 读出当前最高优先级的待处理源并原子
//! 清除其 pending 位，complete 写回源编号宣告服务结束。同一个
//! 源在 claim 与 complete 之间的新触发被硬件闸住，complete 后
//! 补发，所以处理程序天然不会被自己的源重入。
//!
//! 优先级 0 表示永不送达；同优先级时编号小者先被领取。

use crate::hal::platform::{PLIC_BASE, PLIC_NSOURCES, UART0_IRQ};
use crate::hal::{Machine, MachineImpl};

const ENABLE_OFFSET: usize = 0x2000;
const CONTEXT_OFFSET: usize = 0x20_0000;

pub struct Plic<M: Machine> {
    machine: M,
}

impl<M: Machine> Plic<M> {
    pub const fn new(machine: M) -> Self {
        Self { machine }
    }

    fn priority_addr(source: u32) -> usize {
        PLIC_BASE + 4 * source as usize
    }

    fn enable_addr(&self) -> usize {
        PLIC_BASE + ENABLE_OFFSET + 0x80 * self.machine.hart_id()
    }

    fn threshold_addr(&self) -> usize {
        PLIC_BASE + CONTEXT_OFFSET + 0x1000 * self.machine.hart_id()
    }

    fn claim_addr(&self) -> usize {
        self.threshold_addr() + 4
    }

    pub fn set_priority(&self, source: u32, priority: u32) {
        assert!(source < PLIC_NSOURCES);
        self.machine.mmio_write_u32(Self::priority_addr(source), priority);
    }

    /// 在本 hart 的使能位图中打开一个源
    pub fn enable(&self, source: u32) {
        assert!(source < PLIC_NSOURCES);
        let addr = self.enable_addr();
        let bits = self.machine.mmio_read_u32(addr);
        self.machine.mmio_write_u32(addr, bits | (1 << source));
    }

    /// 只有优先级严格大于阈值的源才会送达本 hart
    pub fn set_threshold(&self, threshold: u32) {
        self.machine.mmio_write_u32(self.threshold_addr(), threshold);
    }

    /// 领取一个待处理源，0 表示当前没有可领取的
    pub fn claim(&self) -> u32 {
        self.machine.mmio_read_u32(self.claim_addr())
    }

    /// 归还一个已领取的源。对未使能的源，硬件静默忽略。
    pub fn complete(&self, source: u32) {
        self.machine.mmio_write_u32(self.claim_addr(), source);
    }
}

/// 反复 claim 直到清空，每个领到的源交给 `handler` 再 complete。
/// 一次外部中断陷入可能对应多个待处理源。
pub fn service_pending<M: Machine>(plic: &Plic<M>, mut handler: impl FnMut(u32)) {
    loop {
        let source = plic.claim();
        if source == 0 {
            break;
        }
        handler(source);
        plic.complete(source);
    }
}

pub static PLIC: Plic<MachineImpl> = Plic::new(MachineImpl);

pub fn init() {
    PLIC.set_priority(UART0_IRQ, 1);
    PLIC.enable(UART0_IRQ);
    PLIC.set_threshold(0);
    MachineImpl.enable_external_source();
    log::info!("plic ready, uart irq {} enabled", UART0_IRQ);
}

/// 外部中断分发：目前只有串口一个源
#[cfg(target_arch = "riscv64")]
pub fn handle_external() {
    service_pending(&PLIC, |source| match source {
        UART0_IRQ => crate::drivers::uart::handle_irq(),
        other => log::warn!("claimed unexpected external source {}", other),
    });
}
