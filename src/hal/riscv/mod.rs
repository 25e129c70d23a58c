//! 机器模式 RISC-V 的真实硬件实现。
//!
//! CSR 经 `riscv` crate 访问，设备寄存器经 volatile 指针访问。
//! 汇编入口（启动、陷入、上下文切换）在本目录的子模块中，
//! 只在 riscv64 目标上参与编译。

use riscv::register::{mhartid, mie, mscratch, mstatus};

use super::Machine;

#[cfg(target_arch = "riscv64")]
pub mod boot;
#[cfg(target_arch = "riscv64")]
pub mod switch;
#[cfg(target_arch = "riscv64")]
pub mod trap;

/// 真实机器。零尺寸，可随处复制。
#[derive(Clone, Copy)]
pub struct MachineImpl;

impl Machine for MachineImpl {
    fn hart_id(&self) -> usize {
        mhartid::read()
    }

    fn interrupt_enable(&self) -> bool {
        mstatus::read().mie()
    }

    fn set_interrupt_enable(&self, on: bool) {
        unsafe {
            if on {
                mstatus::set_mie();
            } else {
                mstatus::clear_mie();
            }
        }
    }

    fn enable_software_source(&self) {
        unsafe { mie::set_msoft() }
    }

    fn enable_timer_source(&self) {
        unsafe { mie::set_mtimer() }
    }

    fn enable_external_source(&self) {
        unsafe { mie::set_mext() }
    }

    fn mmio_read_u8(&self, addr: usize) -> u8 {
        unsafe { (addr as *const u8).read_volatile() }
    }

    fn mmio_write_u8(&self, addr: usize, value: u8) {
        unsafe { (addr as *mut u8).write_volatile(value) }
    }

    fn mmio_read_u32(&self, addr: usize) -> u32 {
        unsafe { (addr as *const u32).read_volatile() }
    }

    fn mmio_write_u32(&self, addr: usize, value: u32) {
        unsafe { (addr as *mut u32).write_volatile(value) }
    }

    fn mmio_read_u64(&self, addr: usize) -> u64 {
        unsafe { (addr as *const u64).read_volatile() }
    }

    fn mmio_write_u64(&self, addr: usize, value: u64) {
        unsafe { (addr as *mut u64).write_volatile(value) }
    }
}

/// 把 mscratch 指向一个上下文快照。
///
/// 陷入入口用 mscratch 定位保存区，所以它必须在第一条可能
/// 陷入的指令之前就指向合法内存。
pub fn set_context_pointer(ctx: *mut crate::task::TaskContext) {
    mscratch::write(ctx as usize);
}

/// 第一次 `__switch_to` 之前调用：mret 之后停在机器模式、
/// 并且把全局中断打开（MIE <- MPIE）。
pub fn prepare_first_switch() {
    unsafe {
        mstatus::set_mpp(mstatus::MPP::Machine);
        mstatus::set_mpie();
    }
}

/// 终止执行。致命异常之后由 panic 处理器调用。
pub fn halt() -> ! {
    #[cfg(target_arch = "riscv64")]
    loop {
        unsafe { core::arch::asm!("wfi") };
    }
    #[cfg(not(target_arch = "riscv64"))]
    loop {
        core::hint::spin_loop();
    }
}
