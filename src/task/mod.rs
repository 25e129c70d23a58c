//! 任务子系统的公共接口。
//!
//! 调度器是进程级单例，由 `UPIntrFreeCell` 保护；`current` 指针
//! 只在切换原语内部的窄窗口里变化。协作式让出（`yield_now`）
//! 通过自触发软件中断走陷入路径，最终和定时器抢占共用同一个
//! `Scheduler::advance`。

mod context;
mod manager;
mod task;

pub use context::TaskContext;
pub use manager::{Scheduler, TaskError};
pub use task::TaskControlBlock;

#[cfg(target_arch = "riscv64")]
mod api {
    use lazy_static::lazy_static;
    use log::info;

    use crate::hal::riscv::{prepare_first_switch, switch};
    use crate::sync::UPIntrFreeCell;
    use crate::timer::CLINT;

    use super::{Scheduler, TaskContext, TaskError};

    lazy_static! {
        /// 全局调度器单例：任务表、当前任务引用的唯一属主
        pub static ref SCHEDULER: UPIntrFreeCell<Scheduler> =
            unsafe { UPIntrFreeCell::new(Scheduler::new()) };
    }

    /// 从固定表中创建一个任务，返回任务编号
    pub fn create_task(entry: fn()) -> Result<usize, TaskError> {
        let id = SCHEDULER.exclusive_session(|s| s.create(entry))?;
        info!("task {} created, entry {:#x}", id, entry as usize);
        Ok(id)
    }

    /// 把控制权交给第一个任务，永不返回。
    /// 调用前必须至少创建一个任务。
    pub fn run_tasks() -> ! {
        assert!(
            SCHEDULER.exclusive_session(|s| !s.is_empty()),
            "run_tasks before any create_task"
        );
        prepare_first_switch();
        schedule()
    }

    /// 轮转到下一个任务并切换过去。只允许从陷入路径或
    /// `run_tasks` 进入（两处都保证中断已关闭）。
    pub fn schedule() -> ! {
        let next = SCHEDULER.exclusive_session(|s| s.advance() as *mut TaskContext);
        unsafe { switch::switch_to(next) }
    }

    /// 协作式让出：自触发软件中断，由陷入分发器完成切换
    pub fn yield_now() {
        CLINT.raise_software_interrupt();
    }

    /// 当前任务保存的上下文，系统调用网关用它取参数、写结果
    pub fn current_context() -> *mut TaskContext {
        SCHEDULER.exclusive_session(|s| s.current_context_ptr())
    }
}

#[cfg(target_arch = "riscv64")]
pub use api::{create_task, current_context, run_tasks, schedule, yield_now, SCHEDULER};

/// 粗糙的忙等延时，只为让演示任务消耗 CPU
pub fn task_delay(count: usize) {
    let mut n = count * 50_000;
    while n > 0 {
        core::hint::spin_loop();
        n -= 1;
    }
}

/// 两任务在周期抢占下的端到端行为，全部在宿主机上模拟：
/// 任务按脚本一步一步执行，每 QUANTUM 步在开中断时触发一次
/// “定时器中断”走 `Scheduler::advance`。任务 0 的临界区用
/// 关中断自旋锁包住。
#[cfg(test)]
mod preemption_tests {
    use crate::hal::mock::MockMachine;
    use crate::hal::Machine;
    use crate::sync::IntrLock;

    use super::Scheduler;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Ev {
        Begin(usize),
        Step(usize),
        End(usize),
    }

    #[derive(Clone, Copy)]
    enum Action {
        Acquire,
        Release,
        Emit(Ev),
    }

    fn locked_script(id: usize) -> std::vec::Vec<Action> {
        let mut s = std::vec![Action::Acquire, Action::Emit(Ev::Begin(id))];
        for _ in 0..5 {
            s.push(Action::Emit(Ev::Step(id)));
        }
        s.push(Action::Emit(Ev::End(id)));
        s.push(Action::Release);
        s
    }

    fn plain_script(id: usize) -> std::vec::Vec<Action> {
        let mut s = std::vec![Action::Emit(Ev::Begin(id))];
        for _ in 0..5 {
            s.push(Action::Emit(Ev::Step(id)));
        }
        s.push(Action::Emit(Ev::End(id)));
        s
    }

    #[test]
    fn lock_shields_task0_block_under_preemption() {
        crate::mm::init();
        // tick 间隔比任何输出块都长：任务 1 的块每轮最多被打断一次
        const QUANTUM: usize = 10;
        const TOTAL_STEPS: usize = 600;

        let machine = MockMachine::new(0);
        machine.set_interrupt_enable(true);
        let lock = IntrLock::new(machine.clone());

        fn dummy() {}
        let mut sched = Scheduler::new();
        sched.create(dummy).unwrap();
        sched.create(dummy).unwrap();
        sched.advance();

        let scripts = [locked_script(0), plain_script(1)];
        let mut cursors = [0usize; 2];
        let mut log = std::vec::Vec::new();
        // 一次性比较寄存器：到点后保持 pending，送达时重新武装。
        // 关中断期间中断不消失，开中断后的第一个边界送达
        let mut next_tick = QUANTUM;

        for step in 1..=TOTAL_STEPS {
            let task = sched.current().unwrap();
            let script = &scripts[task];
            match script[cursors[task] % script.len()] {
                Action::Acquire => lock.acquire(),
                Action::Release => lock.release(),
                Action::Emit(ev) => log.push(ev),
            }
            cursors[task] += 1;

            if step >= next_tick && machine.interrupt_enable() {
                next_tick = step + QUANTUM;
                sched.advance();
            }
        }

        // 任务 0 的 begin..end 块绝不被任务 1 的输出打断
        let mut inside0 = false;
        for ev in &log {
            match ev {
                Ev::Begin(0) => inside0 = true,
                Ev::End(0) => inside0 = false,
                Ev::Begin(1) | Ev::Step(1) | Ev::End(1) => {
                    assert!(!inside0, "task 1 output inside task 0 critical block");
                }
                _ => {}
            }
        }

        // 任务 1 的每个 begin..end 块最多被任务 0 打断一次；
        // 一次打断 = 一段连续的任务 0 输出
        let mut inside1 = false;
        let mut intrusions = 0usize;
        let mut in_intrusion = false;
        let mut interrupted_blocks = 0usize;
        for ev in &log {
            match ev {
                Ev::Begin(1) => {
                    inside1 = true;
                    intrusions = 0;
                    in_intrusion = false;
                }
                Ev::End(1) => {
                    inside1 = false;
                    assert!(intrusions <= 1, "task 1 block preempted more than once");
                    if intrusions > 0 {
                        interrupted_blocks += 1;
                    }
                }
                Ev::Step(1) => in_intrusion = false,
                Ev::Begin(0) | Ev::Step(0) | Ev::End(0) => {
                    if inside1 && !in_intrusion {
                        intrusions += 1;
                        in_intrusion = true;
                    }
                }
                _ => {}
            }
        }

        // 两个任务都运行了多轮，且抢占确实发生在任务 1 的块中间
        let begins0 = log.iter().filter(|e| matches!(e, Ev::Begin(0))).count();
        let begins1 = log.iter().filter(|e| matches!(e, Ev::Begin(1))).count();
        assert!(begins0 >= 2 && begins1 >= 2);
        assert!(interrupted_blocks >= 1);
    }
}
