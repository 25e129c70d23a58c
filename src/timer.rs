//! CLINT 定时器与软件中断。
//!
//! mtimecmp 是一次性比较寄存器：mtime >= mtimecmp 时中断线
//! 持续拉高，直到写入新的比较值才撤下。所以每次定时器中断
//! 都必须立刻 `rearm`，否则 mret 之后会立即再次陷入。
//! 间隔以当次的 mtime 为基准，不做相位补偿，tick 会缓慢漂移，
//! 对轮转调度无碍。

use crate::hal::platform::{CLINT_MSIP, CLINT_MTIME, CLINT_MTIMECMP, TICK_CYCLES};
use crate::hal::{Machine, MachineImpl};

pub struct Clint<M: Machine> {
    machine: M,
}

impl<M: Machine> Clint<M> {
    pub const fn new(machine: M) -> Self {
        Self { machine }
    }

    fn mtimecmp_addr(&self) -> usize {
        CLINT_MTIMECMP + 8 * self.machine.hart_id()
    }

    fn msip_addr(&self) -> usize {
        CLINT_MSIP + 4 * self.machine.hart_id()
    }

    pub fn mtime(&self) -> u64 {
        self.machine.mmio_read_u64(CLINT_MTIME)
    }

    pub fn set_mtimecmp(&self, value: u64) {
        self.machine.mmio_write_u64(self.mtimecmp_addr(), value);
    }

    /// 装订下一个到期点：当前时刻 + 一个 tick
    pub fn rearm(&self) {
        self.set_mtimecmp(self.mtime() + TICK_CYCLES);
    }

    /// 向本 hart 发软件中断（msip 置 1）。
    /// 开中断时下一条指令边界即陷入，协作式让出走这条路。
    pub fn raise_software_interrupt(&self) {
        self.machine.mmio_write_u32(self.msip_addr(), 1);
    }

    /// 撤下软件中断。分发器必须在 mret 前调用，
    /// 否则同一次让出会无限重入。
    pub fn clear_software_interrupt(&self) {
        self.machine.mmio_write_u32(self.msip_addr(), 0);
    }

    /// 装订第一个到期点并打开定时器、软件两个中断源
    pub fn init(&self) {
        self.rearm();
        self.machine.enable_timer_source();
        self.machine.enable_software_source();
    }
}

pub static CLINT: Clint<MachineImpl> = Clint::new(MachineImpl);

pub fn init() {
    CLINT.init();
    log::info!("timer armed, {} cycles per tick", TICK_CYCLES);
}

#[cfg(test)]
mod tests {
    use super::Clint;
    use crate::hal::mock::MockMachine;
    use crate::hal::platform::TICK_CYCLES;

    #[test]
    fn init_arms_compare_and_enables_sources() {
        let machine = MockMachine::new(0);
        machine.advance_time(12_345);
        let clint = Clint::new(machine.clone());

        clint.init();
        assert_eq!(machine.mtimecmp(), 12_345 + TICK_CYCLES);
        assert!(machine.timer_source_enabled());
        assert!(machine.software_source_enabled());
    }

    #[test]
    fn rearm_is_relative_to_current_time() {
        let machine = MockMachine::new(0);
        let clint = Clint::new(machine.clone());
        clint.rearm();
        let first = machine.mtimecmp();

        // 处理 tick 花掉的时间不计入下一个间隔
        machine.advance_time(TICK_CYCLES + 77);
        clint.rearm();
        assert_eq!(machine.mtimecmp(), machine.mtime() + TICK_CYCLES);
        assert!(machine.mtimecmp() > first);
    }

    #[test]
    fn software_interrupt_raise_then_clear() {
        let machine = MockMachine::new(0);
        let clint = Clint::new(machine.clone());

        assert!(!machine.software_interrupt_pending());
        clint.raise_software_interrupt();
        assert!(machine.software_interrupt_pending());
        clint.clear_software_interrupt();
        assert!(!machine.software_interrupt_pending());
    }
}
