//! 机器模式单核内核入口。
//!
//! 启动序列：清 bss、串口、日志、内核堆、陷入向量、定时器、
//! PLIC，然后创建演示任务并把控制权交给调度器。
//! 非 riscv64 目标只编译可在宿主机测试的核心逻辑。

#![cfg_attr(not(test), no_std)]
#![cfg_attr(not(test), no_main)]

#[macro_use]
mod console;

mod drivers;
mod hal;
#[cfg(not(test))]
mod lang_items;
mod mm;
mod plic;
mod sync;
mod syscall;
mod task;
mod timer;
mod trap;

#[cfg(target_arch = "riscv64")]
mod kernel {
    use log::info;

    use crate::hal::{Machine, MachineImpl};
    use crate::sync::IntrLock;
    use crate::{console, drivers, mm, plic, syscall, task, timer, trap};

    fn clear_bss() {
        extern "C" {
            fn sbss();
            fn ebss();
        }
        unsafe {
            core::slice::from_raw_parts_mut(
                sbss as usize as *mut u8,
                ebss as usize - sbss as usize,
            )
            .fill(0);
        }
    }

    #[no_mangle]
    pub fn rust_main() -> ! {
        clear_bss();
        drivers::uart::init();
        console::init();
        info!("hart {} booting", MachineImpl.hart_id());
        mm::init();
        info!("kernel heap ready, {} pages", mm::heap_pages());
        trap::init();
        timer::init();
        plic::init();
        task::create_task(user_task0).expect("create task 0");
        task::create_task(user_task1).expect("create task 1");
        task::run_tasks()
    }

    /// 演示任务共用的输出锁。release 无条件开中断，
    /// 所以两个临界区不能嵌套使用同一把锁。
    static PRINT_LOCK: IntrLock<MachineImpl> = IntrLock::new(MachineImpl);

    /// 输出块用关中断自旋锁包住：块内绝不被抢占
    fn user_task0() {
        info!("Task 0: Created!");
        let mut hart: usize = 0;
        if syscall::get_hart_id(&mut hart) == 0 {
            println!("Task 0: running on hart {}", hart);
        }
        loop {
            PRINT_LOCK.acquire();
            println!("Task 0: Begin ...");
            for _ in 0..5 {
                println!("Task 0: Running...");
                task::task_delay(1000);
            }
            println!("Task 0: End ...");
            PRINT_LOCK.release();
        }
    }

    /// 不持锁的对照组：输出块可能被定时器打断，
    /// 末尾主动让出演示软件中断路径
    fn user_task1() {
        info!("Task 1: Created!");
        println!("Task 1: 3 + 4 = {}", syscall::sum(3, 4));
        loop {
            println!("Task 1: Begin ...");
            for _ in 0..5 {
                println!("Task 1: Running...");
                task::task_delay(1000);
            }
            println!("Task 1: End ...");
            task::yield_now();
        }
    }
}

// 宿主机非测试构建只为通过编译，没有可执行语义
#[cfg(all(not(test), not(target_arch = "riscv64")))]
#[no_mangle]
extern "C" fn main() -> i32 {
    0
}
