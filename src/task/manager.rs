//! # 调度器模块
//!
//! ## Overview
//! 固定容量的任务表 + 严格轮转。创建顺序是唯一的排序信号，
//! 没有优先级、没有公平性统计。
//!
//! ## Invariants
//! - `current` 要么为 `None`（首个任务尚未运行），要么指向表内
//!   一个已创建的任务
//! - 只要存在多个就绪任务，任何任务都不会被跳过，也不会连续
//!   运行两轮
//!
//! ## Behavior
//! - `advance` 是调度算法的全部：`(current + 1) % len`。
//!   陷入路径（软件中断 / 定时器中断）和宿主机测试共用这一个函数

use core::fmt;

use crate::hal::platform::MAX_TASKS;

use super::context::TaskContext;
use super::task::TaskControlBlock;

/// 任务创建失败的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskError {
    /// 任务表已满。容量是编译期常量，超额在创建时报错，
    /// 而不是拖到调度时
    CapacityExceeded,
    /// 栈内存不足
    OutOfMemory,
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::CapacityExceeded => write!(f, "task table full ({} slots)", MAX_TASKS),
            TaskError::OutOfMemory => write!(f, "no memory for task stack"),
        }
    }
}

/// 任务表与“当前任务”引用的唯一属主
pub struct Scheduler {
    tasks: [Option<TaskControlBlock>; MAX_TASKS],
    len: usize,
    current: Option<usize>,
}

impl Scheduler {
    pub const fn new() -> Self {
        Self {
            tasks: [const { None }; MAX_TASKS],
            len: 0,
            current: None,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 从固定表中分配一个描述符。除表项与栈的预留外无其他
    /// 副作用；任务要等调度器轮到它才会运行。
    pub fn create(&mut self, entry: fn()) -> Result<usize, TaskError> {
        if self.len == MAX_TASKS {
            return Err(TaskError::CapacityExceeded);
        }
        let tcb = TaskControlBlock::new(entry).map_err(|_| TaskError::OutOfMemory)?;
        let id = self.len;
        self.tasks[id] = Some(tcb);
        self.len += 1;
        Ok(id)
    }

    /// 轮转到下一个任务并返回其上下文。
    /// 单任务时退化为恢复自己。
    ///
    /// 空表调度在设计层面是未定义的，调用方必须保证先创建
    /// 至少一个任务；这里直接断言把它挡在门口。
    pub fn advance(&mut self) -> &mut TaskContext {
        assert!(self.len > 0, "schedule with empty task table");
        let next = match self.current {
            None => 0,
            Some(i) => (i + 1) % self.len,
        };
        self.current = Some(next);
        // 表项在 create 后不再移动，invariant 保证槽位非空
        self.tasks[next].as_mut().unwrap().context_mut()
    }

    /// 当前任务编号；首个任务运行前为 `None`
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// 当前任务的上下文指针，系统调用网关经由它写回结果
    pub fn current_context_ptr(&mut self) -> *mut TaskContext {
        let index = self.current.expect("no task is running");
        self.tasks[index].as_mut().unwrap().context_mut() as *mut TaskContext
    }

    pub fn task(&self, index: usize) -> Option<&TaskControlBlock> {
        self.tasks.get(index).and_then(|slot| slot.as_ref())
    }
}
