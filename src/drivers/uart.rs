//! NS16550A 串口驱动。
//!
//! 发送走轮询（诊断输出不能依赖中断自身），接收走中断：
//! PLIC 路由过来后把接收缓冲取空并回显。QEMU 不检查分频，
//! 初始化只配好 8N1 和 FIFO。

use bitflags::bitflags;

use crate::hal::Machine;

/// 接收保持寄存器（读）/ 发送保持寄存器（写）
const RHR: usize = 0;
const THR: usize = 0;
/// 中断使能寄存器
const IER: usize = 1;
/// FIFO 控制寄存器
const FCR: usize = 2;
/// 线路控制寄存器
const LCR: usize = 3;
/// 线路状态寄存器
const LSR: usize = 5;

bitflags! {
    struct InterruptEnable: u8 {
        const RX_AVAILABLE = 1 << 0;
        const TX_EMPTY = 1 << 1;
    }

    struct LineStatus: u8 {
        const DATA_READY = 1 << 0;
        const THR_EMPTY = 1 << 5;
    }
}

pub struct Uart<M: Machine> {
    machine: M,
    base: usize,
}

impl<M: Machine> Uart<M> {
    pub const fn new(machine: M, base: usize) -> Self {
        Self { machine, base }
    }

    fn read_reg(&self, offset: usize) -> u8 {
        self.machine.mmio_read_u8(self.base + offset)
    }

    fn write_reg(&self, offset: usize, value: u8) {
        self.machine.mmio_write_u8(self.base + offset, value);
    }

    fn line_status(&self) -> LineStatus {
        LineStatus::from_bits_truncate(self.read_reg(LSR))
    }

    /// 8N1、开 FIFO、打开接收中断
    pub fn init(&self) {
        self.write_reg(LCR, 0x03);
        self.write_reg(FCR, 0x01);
        self.write_reg(IER, InterruptEnable::RX_AVAILABLE.bits());
    }

    /// 轮询到发送保持寄存器为空再写入
    pub fn putchar(&self, c: u8) {
        while !self.line_status().contains(LineStatus::THR_EMPTY) {
            core::hint::spin_loop();
        }
        self.write_reg(THR, c);
    }

    pub fn getchar(&self) -> Option<u8> {
        if self.line_status().contains(LineStatus::DATA_READY) {
            Some(self.read_reg(RHR))
        } else {
            None
        }
    }

    /// 接收中断处理：取空缓冲并回显。回车翻译成换行，
    /// 退格发擦除序列。
    pub fn handle_irq(&self) {
        while let Some(ch) = self.getchar() {
            match ch {
                b'\r' => self.putchar(b'\n'),
                0x08 | 0x7f => {
                    self.putchar(0x08);
                    self.putchar(b' ');
                    self.putchar(0x08);
                }
                _ => self.putchar(ch),
            }
        }
    }
}

#[cfg(target_arch = "riscv64")]
mod global {
    use lazy_static::lazy_static;

    use crate::hal::platform::UART0_BASE;
    use crate::hal::MachineImpl;
    use crate::sync::UPIntrFreeCell;

    use super::Uart;

    lazy_static! {
        static ref UART0: UPIntrFreeCell<Uart<MachineImpl>> =
            unsafe { UPIntrFreeCell::new(Uart::new(MachineImpl, UART0_BASE)) };
    }

    pub fn init() {
        UART0.exclusive_access().init();
    }

    pub fn putchar(c: u8) {
        UART0.exclusive_access().putchar(c);
    }

    pub fn handle_irq() {
        UART0.exclusive_access().handle_irq();
    }
}

#[cfg(target_arch = "riscv64")]
pub use global::{handle_irq, init, putchar};
