//! 寄存器系统调用网关。
//!
//! 调用约定沿用函数 ABI：a7 放调用号，a0/a1 放参数，
//! 结果写回快照里的 a0，恢复执行时自然出现在调用方的
//! 返回寄存器里。未知调用号不终止任务，记日志并返回 -1。

use log::warn;
use num_enum::TryFromPrimitive;

use crate::hal::Machine;
use crate::task::TaskContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(usize)]
pub enum SyscallId {
    /// 把当前 hart 号写进 a0 指向的内存
    GetHartId = 1,
    /// 返回 a0 + a1
    Sum = 2,
}

/// 按被打断任务的快照分发一次系统调用，结果写回快照的 a0
pub fn do_syscall<M: Machine>(ctx: &mut TaskContext, machine: &M) {
    let result = match SyscallId::try_from(ctx.a7) {
        Ok(SyscallId::GetHartId) => sys_get_hart_id(ctx.a0 as *mut usize, machine),
        Ok(SyscallId::Sum) => sys_sum(ctx.a0, ctx.a1),
        Err(_) => {
            warn!("unknown syscall {}", ctx.a7);
            -1
        }
    };
    ctx.a0 = result as usize;
}

fn sys_get_hart_id<M: Machine>(out: *mut usize, machine: &M) -> isize {
    if out.is_null() {
        return -1;
    }
    unsafe {
        out.write(machine.hart_id());
    }
    0
}

fn sys_sum(a: usize, b: usize) -> isize {
    a.wrapping_add(b) as isize
}

#[cfg(target_arch = "riscv64")]
mod user {
    use core::arch::asm;

    use super::SyscallId;

    fn ecall(id: SyscallId, arg0: usize, arg1: usize) -> isize {
        let ret;
        unsafe {
            asm!(
                "ecall",
                inlateout("a0") arg0 => ret,
                in("a1") arg1,
                in("a7") id as usize,
            );
        }
        ret
    }

    /// 查询当前 hart 号。成功返回 0 并写入 `out`。
    pub fn get_hart_id(out: &mut usize) -> isize {
        ecall(SyscallId::GetHartId, out as *mut usize as usize, 0)
    }

    /// 由内核计算 a + b，演示带返回值的调用
    pub fn sum(a: usize, b: usize) -> isize {
        ecall(SyscallId::Sum, a, b)
    }
}

#[cfg(target_arch = "riscv64")]
pub use user::{get_hart_id, sum};
