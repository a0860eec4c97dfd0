//! 固定大小连接池
//!
//! 初始化时建立 N 条连接，运行期间不伸缩。连接在空闲时归池所有，
//! 被租用时归单个任务所有；任何时刻 `leased + idle == N`。

use crate::adapter::{Driver, Session};
use crate::error::{AsyncSqlError, AsyncSqlResult};
use parking_lot::{Condvar, Mutex};
use rat_logger::{debug, error, info, warn};
use std::sync::Arc;

/// 池中的一个连接槽位
///
/// 会话为空表示连接已失效且重建失败，槽位仍归池所有
pub struct Connection {
    slot: usize,
    session: Option<Box<dyn Session>>,
}

impl Connection {
    /// 槽位编号
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// 槽位上是否有可用会话
    pub fn is_alive(&self) -> bool {
        self.session.is_some()
    }

    /// 可变访问会话
    pub fn session_mut(&mut self) -> Option<&mut Box<dyn Session>> {
        self.session.as_mut()
    }

    /// 取走会话，槽位变为失效状态
    pub fn take_session(&mut self) -> Option<Box<dyn Session>> {
        self.session.take()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("slot", &self.slot)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// 连接池统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// 连接总数 N
    pub size: usize,
    /// 空闲连接数
    pub idle: usize,
    /// 租用中的连接数
    pub leased: usize,
}

struct PoolState {
    idle: Vec<Connection>,
    leased: usize,
    /// 整池预留进行中，普通租用需等待
    reserved: bool,
}

/// 连接池
pub struct ConnectionPool {
    alias: String,
    driver: Arc<dyn Driver>,
    size: usize,
    state: Mutex<PoolState>,
    available: Condvar,
    /// 只保护重建过程，不覆盖语句执行
    reconnect_lock: tokio::sync::Mutex<()>,
}

impl ConnectionPool {
    /// 建立 N 条连接
    ///
    /// 任意一条连接失败即返回错误，已建立的连接全部关闭
    pub async fn initialize(
        alias: &str,
        driver: Arc<dyn Driver>,
        size: usize,
    ) -> AsyncSqlResult<Self> {
        info!("初始化连接池: 别名={}, 连接数={}", alias, size);

        let mut idle = Vec::with_capacity(size);
        for slot in 0..size {
            match driver.connect().await {
                Ok(session) => idle.push(Connection {
                    slot,
                    session: Some(session),
                }),
                Err(e) => {
                    error!("连接池初始化失败: 别名={}, 槽位={}, 错误={}", alias, slot, e);
                    for conn in idle {
                        if let Some(session) = conn.session {
                            session.close().await;
                        }
                    }
                    return Err(e);
                }
            }
        }

        Ok(Self {
            alias: alias.to_string(),
            driver,
            size,
            state: Mutex::new(PoolState {
                idle,
                leased: 0,
                reserved: false,
            }),
            available: Condvar::new(),
            reconnect_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// 连接总数
    pub fn size(&self) -> usize {
        self.size
    }

    /// 租用一个连接，没有空闲连接时阻塞当前线程
    pub fn lease(&self) -> Connection {
        let mut state = self.state.lock();
        loop {
            if !state.reserved {
                if let Some(conn) = state.idle.pop() {
                    state.leased += 1;
                    return conn;
                }
            }
            self.available.wait(&mut state);
        }
    }

    /// 归还连接
    pub fn release(&self, conn: Connection) {
        let mut state = self.state.lock();
        state.leased -= 1;
        state.idle.push(conn);
        drop(state);
        self.available.notify_all();
    }

    /// 预留全部 N 个连接
    ///
    /// 预留期间新的租用请求等待；已租出的连接归还后立即被收集，
    /// 因此只需等待正在执行的任务结束。返回的连接按槽位排序。
    pub fn lease_all(&self) -> Vec<Connection> {
        let mut state = self.state.lock();
        // 同一时刻只允许一个整池预留
        while state.reserved {
            self.available.wait(&mut state);
        }
        state.reserved = true;

        let mut taken = Vec::with_capacity(self.size);
        loop {
            let count = state.idle.len();
            taken.extend(state.idle.drain(..));
            state.leased += count;
            if taken.len() == self.size {
                break;
            }
            self.available.wait(&mut state);
        }
        state.reserved = false;
        drop(state);

        taken.sort_by_key(|c| c.slot);
        taken
    }

    /// 归还一组连接
    pub fn release_all(&self, conns: Vec<Connection>) {
        let mut state = self.state.lock();
        state.leased -= conns.len();
        state.idle.extend(conns);
        drop(state);
        self.available.notify_all();
    }

    /// 用原始凭据重建一个租用中的连接
    ///
    /// 旧会话先关闭；重建失败时槽位保持为空，调用方仍须归还该连接。
    pub async fn reconnect(&self, conn: &mut Connection) -> AsyncSqlResult<()> {
        let _guard = self.reconnect_lock.lock().await;
        warn!("重建连接: 别名={}, 槽位={}", self.alias, conn.slot);

        if let Some(old) = conn.session.take() {
            old.close().await;
        }

        match self.driver.connect().await {
            Ok(session) => {
                conn.session = Some(session);
                info!("连接重建成功: 别名={}, 槽位={}", self.alias, conn.slot);
                Ok(())
            }
            Err(e) => {
                error!("连接重建失败: 别名={}, 槽位={}, 错误={}", self.alias, conn.slot, e);
                let detail = match e {
                    AsyncSqlError::ConnectError { message } => message,
                    other => other.to_string(),
                };
                Err(crate::async_sql_error!(reconnect, detail))
            }
        }
    }

    /// 当前统计
    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            size: self.size,
            idle: state.idle.len(),
            leased: state.leased,
        }
    }

    /// 关闭所有连接，返回实际关闭的会话数
    ///
    /// 只能在所有工作线程退出后调用，此时全部连接都应处于空闲状态
    pub async fn close_all(&self) -> usize {
        let conns = {
            let mut state = self.state.lock();
            if state.leased > 0 {
                warn!("关闭连接池时仍有租用中的连接: 别名={}, 数量={}", self.alias, state.leased);
            }
            std::mem::take(&mut state.idle)
        };

        let mut closed = 0;
        for conn in conns {
            if let Some(session) = conn.session {
                session.close().await;
                closed += 1;
            }
        }
        debug!("连接池已关闭: 别名={}, 关闭会话数={}", self.alias, closed);
        closed
    }
}
