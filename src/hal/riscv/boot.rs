//! 启动入口。
//!
//! hart 0 设好启动栈后进入 `rust_main`，其余 hart 原地停住：
//! 本内核是单 hart 设计，次级核参与进来只会破坏共享状态。

use core::arch::global_asm;

global_asm!(
    r#"
    .section .text.entry
    .globl _start
_start:
    csrr    t0, mhartid
    bnez    t0, 1f
    la      sp, boot_stack_top
    call    rust_main
1:
    wfi
    j       1b

    .section .bss.stack
    .globl  boot_stack_lower_bound
boot_stack_lower_bound:
    .space  4096 * 16
    .globl  boot_stack_top
boot_stack_top:
"#
);
