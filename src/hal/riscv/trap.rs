//! 陷入入口汇编。
//!
//! mscratch 始终指向当前任务的 `TaskContext`。入口把被打断的
//! 寄存器组（含 mepc）整体存进去，再进入 Rust 侧的 `trap_handler`；
//! 返回值写回 mepc 后按同一布局恢复。字段偏移与
//! `task::context` 中的 `#[repr(C)]` 布局逐字节对应，
//! 两边必须一起改。
//!
//! 注意：机器模式内核没有独立的陷入栈，`trap_handler` 跑在被
//! 打断任务自己的栈上。

use core::arch::global_asm;

global_asm!(
    r#"
    .section .text
    .globl __trap_entry
    .align 2
__trap_entry:
    # t6 <-> mscratch：t6 = 当前上下文指针，原 t6 暂存在 mscratch
    csrrw   t6, mscratch, t6

    sd      ra,  0*8(t6)
    sd      sp,  1*8(t6)
    sd      gp,  2*8(t6)
    sd      tp,  3*8(t6)
    sd      t0,  4*8(t6)
    sd      t1,  5*8(t6)
    sd      t2,  6*8(t6)
    sd      s0,  7*8(t6)
    sd      s1,  8*8(t6)
    sd      a0,  9*8(t6)
    sd      a1, 10*8(t6)
    sd      a2, 11*8(t6)
    sd      a3, 12*8(t6)
    sd      a4, 13*8(t6)
    sd      a5, 14*8(t6)
    sd      a6, 15*8(t6)
    sd      a7, 16*8(t6)
    sd      s2, 17*8(t6)
    sd      s3, 18*8(t6)
    sd      s4, 19*8(t6)
    sd      s5, 20*8(t6)
    sd      s6, 21*8(t6)
    sd      s7, 22*8(t6)
    sd      s8, 23*8(t6)
    sd      s9, 24*8(t6)
    sd      s10, 25*8(t6)
    sd      s11, 26*8(t6)
    sd      t3, 27*8(t6)
    sd      t4, 28*8(t6)
    sd      t5, 29*8(t6)

    # 补存真正的 t6，并把 mscratch 恢复成上下文指针
    mv      t5, t6
    csrr    t6, mscratch
    sd      t6, 30*8(t5)
    csrw    mscratch, t5

    # 恢复地址一并入册，任务可能在别处被重新调度
    csrr    a0, mepc
    sd      a0, 31*8(t5)

    csrr    a1, mcause
    call    trap_handler

    # trap_handler 返回新的 mepc；切换路径不会走到这里
    csrw    mepc, a0
    csrr    t6, mscratch

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
