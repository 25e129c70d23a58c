//! 测试用的软件模拟机器。
//!
//! 模拟三样东西：全局中断开关、CLINT（mtime / mtimecmp / msip）、
//! 以及一个带 claim/complete 门控的 PLIC 行为模型。PLIC 模型
//! 实现的正是硬件手册承诺的语义：claim 原子清 pending、
//! 服务期间的新触发被闸住、complete 对未使能的源静默忽略、
//! 同优先级按最小源编号取胜。

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use super::platform::{
    CLINT_MSIP, CLINT_MTIME, CLINT_MTIMECMP, PLIC_BASE, PLIC_NSOURCES, UART0_BASE,
};
use super::Machine;

const PLIC_ENABLE_OFFSET: usize = 0x2000;
const PLIC_CONTEXT_OFFSET: usize = 0x20_0000;
const UART_LSR: usize = UART0_BASE + 5;
// LSR: 发送保持寄存器恒为空，避免 putchar 轮询卡死
const LSR_IDLE: u8 = 0x60;

#[derive(Default)]
struct PlicModel {
    priority: [u32; PLIC_NSOURCES as usize],
    enable: u32,
    threshold: u32,
    pending: u32,
    in_service: u32,
    /// 服务期间到达的触发，complete 后补发
    deferred: u32,
}

impl PlicModel {
    fn raise(&mut self, source: u32) {
        let bit = 1u32 << source;
        if self.in_service & bit != 0 {
            self.deferred |= bit;
        } else {
            self.pending |= bit;
        }
    }

    fn claim(&mut self) -> u32 {
        let mut best: u32 = 0;
        let mut best_prio: u32 = self.threshold;
        for source in 1..PLIC_NSOURCES {
            let bit = 1u32 << source;
            if self.pending & bit == 0 || self.enable & bit == 0 {
                continue;
            }
            let prio = self.priority[source as usize];
            // 优先级 0 表示永不中断；同优先级最小编号者胜
            if prio > best_prio {
                best = source;
                best_prio = prio;
            }
        }
        if best != 0 {
            let bit = 1u32 << best;
            self.pending &= !bit;
            self.in_service |= bit;
        }
        best
    }

    fn complete(&mut self, source: u32) {
        if source >= PLIC_NSOURCES {
            return;
        }
        let bit = 1u32 << source;
        if self.enable & bit == 0 {
            // 硬件对不认识的 completion 静默忽略
            return;
        }
        self.in_service &= !bit;
        if self.deferred & bit != 0 {
            self.deferred &= !bit;
            self.pending |= bit;
        }
    }
}

struct MockState {
    hart_id: usize,
    interrupt_enable: bool,
    soft_source: bool,
    timer_source: bool,
    external_source: bool,
    mtime: u64,
    mtimecmp: u64,
    msip: u32,
    plic: PlicModel,
    uart_out: Vec<u8>,
}

/// 可克隆的模拟机器句柄；克隆体共享同一份状态，
/// 方便把同一台“机器”交给多个组件。
#[derive(Clone)]
pub struct MockMachine {
    state: Rc<RefCell<MockState>>,
}

impl MockMachine {
    pub fn new(hart_id: usize) -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState {
                hart_id,
                interrupt_enable: false,
                soft_source: false,
                timer_source: false,
                external_source: false,
                mtime: 0,
                mtimecmp: 0,
                msip: 0,
                plic: PlicModel::default(),
                uart_out: Vec::new(),
            })),
        }
    }

    /// 模拟一个外部设备拉高中断线
    pub fn raise_irq(&self, source: u32) {
        self.state.borrow_mut().plic.raise(source);
    }

    pub fn advance_time(&self, cycles: u64) {
        self.state.borrow_mut().mtime += cycles;
    }

    pub fn mtime(&self) -> u64 {
        self.state.borrow().mtime
    }

    pub fn mtimecmp(&self) -> u64 {
        self.state.borrow().mtimecmp
    }

    pub fn software_interrupt_pending(&self) -> bool {
        self.state.borrow().msip != 0
    }

    pub fn timer_source_enabled(&self) -> bool {
        self.state.borrow().timer_source
    }

    pub fn software_source_enabled(&self) -> bool {
        self.state.borrow().soft_source
    }

    pub fn external_source_enabled(&self) -> bool {
        self.state.borrow().external_source
    }

    pub fn uart_output(&self) -> Vec<u8> {
        self.state.borrow().uart_out.clone()
    }
}

impl Machine for MockMachine {
    fn hart_id(&self) -> usize {
        self.state.borrow().hart_id
    }

    fn interrupt_enable(&self) -> bool {
        self.state.borrow().interrupt_enable
    }

    fn set_interrupt_enable(&self, on: bool) {
        self.state.borrow_mut().interrupt_enable = on;
    }

    fn enable_software_source(&self) {
        self.state.borrow_mut().soft_source = true;
    }

    fn enable_timer_source(&self) {
        self.state.borrow_mut().timer_source = true;
    }

    fn enable_external_source(&self) {
        self.state.borrow_mut().external_source = true;
    }

    fn mmio_read_u8(&self, addr: usize) -> u8 {
        if addr == UART_LSR {
            LSR_IDLE
        } else {
            0
        }
    }

    fn mmio_write_u8(&self, addr: usize, value: u8) {
        if addr == UART0_BASE {
            self.state.borrow_mut().uart_out.push(value);
        }
    }

    fn mmio_read_u32(&self, addr: usize) -> u32 {
        let mut state = self.state.borrow_mut();
        let hart = state.hart_id;
        if addr == CLINT_MSIP + 4 * hart {
            return state.msip;
        }
        if addr >= PLIC_BASE && addr < PLIC_BASE + PLIC_ENABLE_OFFSET {
            let source = (addr - PLIC_BASE) / 4;
            return state.plic.priority[source];
        }
        if addr == PLIC_BASE + PLIC_ENABLE_OFFSET + 0x80 * hart {
            return state.plic.enable;
        }
        if addr == PLIC_BASE + PLIC_CONTEXT_OFFSET + 0x1000 * hart {
            return state.plic.threshold;
        }
        if addr == PLIC_BASE + PLIC_CONTEXT_OFFSET + 0x1000 * hart + 4 {
            return state.plic.claim();
        }
        panic!("mock: unmapped u32 read at {:#x}", addr);
    }

    fn mmio_write_u32(&self, addr: usize, value: u32) {
        let mut state = self.state.borrow_mut();
        let hart = state.hart_id;
        if addr == CLINT_MSIP + 4 * hart {
            state.msip = value;
            return;
        }
        if addr >= PLIC_BASE && addr < PLIC_BASE + PLIC_ENABLE_OFFSET {
            let source = (addr - PLIC_BASE) / 4;
            state.plic.priority[source] = value;
            return;
        }
        if addr == PLIC_BASE + PLIC_ENABLE_OFFSET + 0x80 * hart {
            state.plic.enable = value;
            return;
        }
        if addr == PLIC_BASE + PLIC_CONTEXT_OFFSET + 0x1000 * hart {
            state.plic.threshold = value;
            return;
        }
        if addr == PLIC_BASE + PLIC_CONTEXT_OFFSET + 0x1000 * hart + 4 {
            state.plic.complete(value);
            return;
        }
        panic!("mock: unmapped u32 write at {:#x}", addr);
    }

    fn mmio_read_u64(&self, addr: usize) -> u64 {
        let state = self.state.borrow();
        if addr == CLINT_MTIME {
            return state.mtime;
        }
        if addr == CLINT_MTIMECMP + 8 * state.hart_id {
            return state.mtimecmp;
        }
        panic!("mock: unmapped u64 read at {:#x}", addr);
    }

    fn mmio_write_u64(&self, addr: usize, value: u64) {
        let mut state = self.state.borrow_mut();
        if addr == CLINT_MTIMECMP + 8 * state.hart_id {
            state.mtimecmp = value;
            return;
        }
        panic!("mock: unmapped u64 write at {:#x}", addr);
    }
}
