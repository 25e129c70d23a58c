//! # 陷入分发模块
//!
//! ## Overview
//! 所有机器模式陷入（中断与同步异常）的唯一入口。汇编入口把被
//! 打断的上下文存进 mscratch 指向的快照后调用 `trap_handler`，
//! 本模块按 mcause 分类处理：
//! - 软件中断：撤下 msip，轮转调度
//! - 定时器中断：重新装订 mtimecmp，轮转调度
//! - 外部中断：走 PLIC claim/complete 握手，原地恢复
//! - 机器模式 ecall：进系统调用网关，跳过 ecall 指令恢复
//!
//! ## Invariants
//! - 每个恢复路径返回的 mepc 都指向一条应当执行的指令：
//!   中断恢复到被打断处，ecall 恢复到 ecall 的下一条
//! - 未识别的中断只记日志不终止；未识别的同步异常一律致命，
//!   原地重试只会再次陷入
//!
//! ## Assumptions
//! - 陷入处理期间全局中断保持关闭（硬件进入陷入时自动清 MIE），
//!   处理程序不会被嵌套打断

use bit_field::BitField;

/// 异步中断的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// 机器模式软件中断（msip），协作式让出走这里
    Software,
    /// 机器模式定时器中断（mtimecmp 到期）
    Timer,
    /// 机器模式外部中断（PLIC 汇集的设备线）
    External,
    Unknown(usize),
}

/// 同步异常的种类。只有机器模式 ecall 是预期内的。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    /// 机器模式下执行 ecall，系统调用入口
    EcallMachine,
    Unknown(usize),
}

/// mcause 的结构化视图
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapCause {
    Interrupt(Interrupt),
    Exception(Exception),
}

impl TrapCause {
    /// 最高位区分中断与异常，其余位是原因编号
    pub fn decode(mcause: usize) -> Self {
        let code_bits = usize::BITS as usize - 1;
        let code = mcause.get_bits(..code_bits);
        if mcause.get_bit(code_bits) {
            TrapCause::Interrupt(match code {
                3 => Interrupt::Software,
                7 => Interrupt::Timer,
                11 => Interrupt::External,
                other => Interrupt::Unknown(other),
            })
        } else {
            TrapCause::Exception(match code {
                11 => Exception::EcallMachine,
                other => Exception::Unknown(other),
            })
        }
    }
}

#[cfg(target_arch = "riscv64")]
mod handler {
    use log::{error, warn};
    use riscv::register::mtvec::{self, TrapMode};

    use crate::hal::riscv::set_context_pointer;
    use crate::hal::MachineImpl;
    use crate::sync::UPSafeCellRaw;
    use crate::task::TaskContext;
    use crate::{plic, syscall, task, timer};

    use super::{Exception, Interrupt, TrapCause};

    extern "C" {
        fn __trap_entry();
    }

    /// 第一次 `__switch_to` 之前 mscratch 的落点。
    /// 启动阶段若有陷入，寄存器存到这里而不是某个任务的快照。
    static BOOT_CONTEXT: UPSafeCellRaw<TaskContext> =
        unsafe { UPSafeCellRaw::new(TaskContext::zero_init()) };

    pub fn init() {
        unsafe {
            mtvec::write(__trap_entry as usize, TrapMode::Direct);
        }
        set_context_pointer(BOOT_CONTEXT.get_mut());
        log::info!("trap vector installed at {:#x}", __trap_entry as usize);
    }

    /// 汇编入口调用的分发函数。
    /// 返回值是恢复执行用的 mepc；调度分支不返回，
    /// 下一个任务由切换原语自己 mret 出去。
    #[no_mangle]
    pub extern "C" fn trap_handler(epc: usize, mcause: usize) -> usize {
        match TrapCause::decode(mcause) {
            TrapCause::Interrupt(Interrupt::Software) => {
                // 先撤 msip 再调度，否则让出方恢复时立刻重入
                timer::CLINT.clear_software_interrupt();
                task::schedule()
            }
            TrapCause::Interrupt(Interrupt::Timer) => {
                timer::CLINT.rearm();
                task::schedule()
            }
            TrapCause::Interrupt(Interrupt::External) => {
                plic::handle_external();
                epc
            }
            TrapCause::Interrupt(Interrupt::Unknown(code)) => {
                warn!("unhandled interrupt {}, resuming", code);
                epc
            }
            TrapCause::Exception(Exception::EcallMachine) => {
                let ctx = task::current_context();
                unsafe { syscall::do_syscall(&mut *ctx, &MachineImpl) };
                // ecall 宽 4 字节，恢复到它的下一条指令
                epc + 4
            }
            TrapCause::Exception(Exception::Unknown(code)) => {
                error!("fatal exception {} at {:#x}", code, epc);
                panic!("unrecoverable exception");
            }
        }
    }
}

#[cfg(target_arch = "riscv64")]
pub use handler::{init, trap_handler};
