//! # 硬件访问层
//!
//! ## Overview
//! 本模块定义了内核核心逻辑与硬件之间唯一的边界：`Machine` trait。
//! 所有 CSR 访问与内存映射寄存器（MMIO）访问都必须经过它，
//! 核心逻辑（调度、陷入分发、PLIC 握手、系统调用）对具体硬件一无所知。
//!
//! ## Design
//! - `riscv::MachineImpl` 是真实的机器模式实现（CSR + volatile MMIO）
//! - `mock::MockMachine` 是测试用的软件模拟实现（含 CLINT / PLIC 行为模型）
//! - 泛型组件（`Plic<M>`、`Clint<M>`、`IntrLock<M>`）在宿主机上
//!   用模拟实现跑测试，在目标机上用真实实现跑内核
//!
//! ## Assumptions
//! - 单 hart。`Machine` 的中断开关只约束当前 hart，
//!   在多核上关中断不构成互斥，这是设计边界而不是待修的缺陷。

pub mod platform;
pub mod riscv;

#[cfg(test)]
pub mod mock;

pub use riscv::MachineImpl;

/// 硬件寄存器访问接口
///
/// ## Behavior
/// - CSR 类操作（hart 号、全局中断开关、中断源使能）
/// - MMIO 类操作（按宽度读写内存映射寄存器）
///
/// ## Safety
/// - 实现者保证 MMIO 访问是 volatile 的且地址在设备寄存器范围内
/// - 全局中断开关（mstatus.MIE 或其模拟）只有一位，
///   `set_interrupt_enable(false)` 后任何异步中断都不会抢占当前执行流
pub trait Machine {
    fn hart_id(&self) -> usize;

    /// 读全局中断使能位
    fn interrupt_enable(&self) -> bool;
    /// 写全局中断使能位
    fn set_interrupt_enable(&self, on: bool);

    /// 使能机器模式软件中断源（mie.MSIE）
    fn enable_software_source(&self);
    /// 使能机器模式定时器中断源（mie.MTIE）
    fn enable_timer_source(&self);
    /// 使能机器模式外部中断源（mie.MEIE）
    fn enable_external_source(&self);

    fn mmio_read_u8(&self, addr: usize) -> u8;
    fn mmio_write_u8(&self, addr: usize, value: u8);
    fn mmio_read_u32(&self, addr: usize) -> u32;
    fn mmio_write_u32(&self, addr: usize, value: u32);
    fn mmio_read_u64(&self, addr: usize) -> u64;
    fn mmio_write_u64(&self, addr: usize, value: u64);
}

/// 诊断输出的字节汇，`print!` 一族最终落到这里
#[cfg(target_arch = "riscv64")]
pub fn console_putchar(c: u8) {
    crate::drivers::uart::putchar(c);
}

/// 宿主机上没有串口，丢弃输出
#[cfg(not(target_arch = "riscv64"))]
pub fn console_putchar(_c: u8) {}
