//! # 任务上下文（TaskContext）模块
//!
//! ## Overview
//! 保存一个任务完整的通用寄存器快照外加恢复地址（pc）。
//! 任意时刻恰有一个上下文“活着”（装在硬件寄存器里），
//! 其余都是惰性数据。
//!
//! ## Safety
//! - `#[repr(C)]` 保证字段布局稳定：陷入入口和切换原语的汇编
//!   按 `字段序号 * 8` 寻址，系统调用网关按字段名读写，
//!   三者必须对同一套偏移达成一致
//! - 字段顺序即 x1..x31 的编号顺序，pc 固定在最后
//!
//! ## Invariants
//! - `sp` 指向该任务专属栈内部，16 字节对齐
//! - `pc` 是任务下次恢复执行的地址

/// 完整的寄存器快照。rv64 上共 32 × 8 = 256 字节。
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskContext {
    pub ra: usize,  // x1
    pub sp: usize,  // x2
    pub gp: usize,  // x3
    pub tp: usize,  // x4
    pub t0: usize,  // x5
    pub t1: usize,  // x6
    pub t2: usize,  // x7
    pub s0: usize,  // x8
    pub s1: usize,  // x9
    pub a0: usize,  // x10
    pub a1: usize,  // x11
    pub a2: usize,  // x12
    pub a3: usize,  // x13
    pub a4: usize,  // x14
    pub a5: usize,  // x15
    pub a6: usize,  // x16
    pub a7: usize,  // x17
    pub s2: usize,  // x18
    pub s3: usize,  // x19
    pub s4: usize,  // x20
    pub s5: usize,  // x21
    pub s6: usize,  // x22
    pub s7: usize,  // x23
    pub s8: usize,  // x24
    pub s9: usize,  // x25
    pub s10: usize, // x26
    pub s11: usize, // x27
    pub t3: usize,  // x28
    pub t4: usize,  // x29
    pub t5: usize,  // x30
    pub t6: usize,  // x31
    /// 恢复地址，切换原语最后写入 mepc
    pub pc: usize,
}

impl TaskContext {
    /// 构造一个全零快照，用于占位或等待首次初始化
    pub const fn zero_init() -> Self {
        Self {
            ra: 0,
            sp: 0,
            gp: 0,
            tp: 0,
            t0: 0,
            t1: 0,
            t2: 0,
            s0: 0,
            s1: 0,
            a0: 0,
            a1: 0,
            a2: 0,
            a3: 0,
            a4: 0,
            a5: 0,
            a6: 0,
            a7: 0,
            s2: 0,
            s3: 0,
            s4: 0,
            s5: 0,
            s6: 0,
            s7: 0,
            s8: 0,
            s9: 0,
            s10: 0,
            s11: 0,
            t3: 0,
            t4: 0,
            t5: 0,
            t6: 0,
            pc: 0,
        }
    }

    /// 初始化一个首次运行的上下文：从 `entry` 开始执行，
    /// 栈顶为 `stack_top`，`entry` 若意外返回则落入 `return_to`。
    pub fn init(&mut self, entry: usize, stack_top: usize, return_to: usize) {
        *self = Self::zero_init();
        self.pc = entry;
        self.sp = stack_top & !0xf;
        self.ra = return_to;
    }
}
