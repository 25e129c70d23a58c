//! 上下文切换原语。
//!
//! 前提：目标上下文要么由 `TaskControlBlock::new` 初始化过，
//! 要么由陷入入口完整保存过，不存在写了一半的快照。
//! 本原语必须在关中断状态下执行（陷入路径天然满足，
//! 启动路径在第一次开中断之前调用）。

use core::arch::global_asm;

use crate::task::TaskContext;

global_asm!(
    r#"
    .section .text
    .globl __switch_to
    .align 2
__switch_to:
    # a0 = 目标上下文。此后 mscratch 指向它，陷入入口据此保存。
    csrw    mscratch, a0
    ld      t0, 31*8(a0)
    csrw    mepc, t0

    mv      t6, a0
    ld      ra,  0*8(t6)
    ld      sp,  1*8(t6)
    ld      gp,  2*8(t6)
    ld      tp,  3*8(t6)
    ld      t0,  4*8(t6)
    ld      t1,  5*8(t6)
    ld      t2,  6*8(t6)
    ld      s0,  7*8(t6)
    ld      s1,  8*8(t6)
    ld      a0,  9*8(t6)
    ld      a1, 10*8(t6)
    ld      a2, 11*8(t6)
    ld      a3, 12*8(t6)
    ld      a4, 13*8(t6)
    ld      a5, 14*8(t6)
    ld      a6, 15*8(t6)
    ld      a7, 16*8(t6)
    ld      s2, 17*8(t6)
    ld      s3, 18*8(t6)
    ld      s4, 19*8(t6)
    ld      s5, 20*8(t6)
    ld      s6, 21*8(t6)
    ld      s7, 22*8(t6)
    ld      s8, 23*8(t6)
    ld      s9, 24*8(t6)
    ld      s10, 25*8(t6)
    ld      s11, 26*8(t6)
    ld      t3, 27*8(t6)
    ld      t4, 28*8(t6)
    ld      t5, 29*8(t6)
    ld      t6, 30*8(t6)
    mret
"#
);

extern "C" {
    fn __switch_to(next: *const TaskContext) -> !;
}

/// 恢复 `next` 的寄存器组并把控制权交给它，永不返回调用者。
///
/// # Safety
/// 调用者保证 `next` 指向一个完整初始化的上下文，且当前
/// 处于关中断状态。
pub unsafe fn switch_to(next: *const TaskContext) -> ! {
    __switch_to(next)
}
