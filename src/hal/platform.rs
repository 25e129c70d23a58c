//! QEMU `virt` 平台配置
//!
//! 所有内存映射寄存器地址与平台常量都集中在这里，
//! 内核其他模块不允许出现魔法地址。

/// CPU 时钟频率（Hz），QEMU virt 的 CLINT 计时基准
pub const CLOCK_FREQ: usize = 10_000_000;
/// 每秒定时器中断次数
pub const TICKS_PER_SEC: usize = 100;
/// 一次定时器中断间隔的 cycle 数
pub const TICK_CYCLES: u64 = (CLOCK_FREQ / TICKS_PER_SEC) as u64;

/// NS16550A 串口
pub const UART0_BASE: usize = 0x1000_0000;
/// UART0 在 PLIC 中的中断源编号
pub const UART0_IRQ: u32 = 10;

/// CLINT（Core Local Interruptor）
pub const CLINT_BASE: usize = 0x0200_0000;
/// 软件中断触发寄存器，每个 hart 一个 32 位字
pub const CLINT_MSIP: usize = CLINT_BASE;
/// 定时器比较寄存器，每个 hart 一个 64 位字
pub const CLINT_MTIMECMP: usize = CLINT_BASE + 0x4000;
/// 全局单调计时器
pub const CLINT_MTIME: usize = CLINT_BASE + 0xbff8;

/// PLIC（Platform Level Interrupt Controller）
pub const PLIC_BASE: usize = 0x0c00_0000;
/// PLIC 支持的中断源数量（本内核只关心前 32 个）
pub const PLIC_NSOURCES: u32 = 32;

pub const PAGE_SIZE: usize = 4096;
pub const PAGE_SIZE_BITS: usize = 12;

/// 内核堆大小，任务栈从这里划出
pub const KERNEL_HEAP_SIZE: usize = 0x4_0000;

/// 任务表容量（固定，不支持动态扩容）
pub const MAX_TASKS: usize = 8;
/// 每个任务栈占用的页数
pub const TASK_STACK_PAGES: usize = 2;
