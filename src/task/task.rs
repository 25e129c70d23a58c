//! 任务描述符与任务栈。
//!
//! 栈从 `mm` 协作者按页租来，被任务独占，生命周期内不改尺寸。
//! 描述符在启动期创建一次，本设计没有任务退出路径。

use core::ptr::NonNull;

use crate::hal::platform::{PAGE_SIZE, TASK_STACK_PAGES};
use crate::mm::{self, AllocError};

use super::context::TaskContext;

/// 任务专属栈：一段页对齐的内存区域
pub struct TaskStack {
    base: NonNull<u8>,
    pages: usize,
}

impl TaskStack {
    fn new(pages: usize) -> Result<Self, AllocError> {
        let base = mm::alloc_pages(pages)?;
        Ok(Self { base, pages })
    }

    /// 栈顶（高地址端），页对齐因而天然满足 16 字节对齐
    pub fn top(&self) -> usize {
        self.base.as_ptr() as usize + self.pages * PAGE_SIZE
    }
}

impl Drop for TaskStack {
    fn drop(&mut self) {
        mm::free_pages(self.base, self.pages);
    }
}

/// 任务描述符：保存的寄存器快照 + 独占栈 + 入口例程
pub struct TaskControlBlock {
    context: TaskContext,
    stack: TaskStack,
    entry: fn(),
}

impl TaskControlBlock {
    /// 预留栈并初始化上下文；任务在调度器选中它之前不会运行。
    pub fn new(entry: fn()) -> Result<Self, AllocError> {
        let stack = TaskStack::new(TASK_STACK_PAGES)?;
        let mut context = TaskContext::zero_init();
        context.init(entry as usize, stack.top(), task_return_guard as usize);
        Ok(Self {
            context,
            stack,
            entry,
        })
    }

    pub fn context(&self) -> &TaskContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut TaskContext {
        &mut self.context
    }

    pub fn entry(&self) -> fn() {
        self.entry
    }

    pub fn stack_top(&self) -> usize {
        self.stack.top()
    }
}

/// 任务入口意外返回时的着陆点。本设计里任务永远自循环，
/// 走到这里说明任务写错了。
fn task_return_guard() -> ! {
    panic!("task entry routine returned");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_points_at_entry_and_stack_top() {
        crate::mm::init();
        fn entry() {}
        let tcb = TaskControlBlock::new(entry).unwrap();
        assert_eq!(tcb.context().pc, entry as usize);
        assert_eq!(tcb.context().sp, tcb.stack_top());
        assert_eq!(tcb.context().sp % 16, 0);
        assert_eq!(tcb.context().ra, task_return_guard as usize);
    }

    #[test]
    fn stacks_do_not_overlap() {
        crate::mm::init();
        fn entry() {}
        let a = TaskControlBlock::new(entry).unwrap();
        let b = TaskControlBlock::new(entry).unwrap();
        let a_top = a.stack_top();
        let b_top = b.stack_top();
        let span = TASK_STACK_PAGES * PAGE_SIZE;
        assert!(a_top <= b_top - span || b_top <= a_top - span);
    }
}
