use std::fmt::Debug;
use std::marker::PhantomData;
use std::str::from_utf8;
use std::time::Duration;

use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::{redis, Connection};
use error_stack::{Report, ResultExt};
use redis::streams::StreamReadOptions;
use redis::{RedisResult, Value};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, error, warn};
use uuid::Uuid;

use kernel::interface::database::DatabaseConnection;
use kernel::interface::mq::{
    DestructQueueInfo, ErrorOperation, ErroredInfo, Handler, MQConfig, MessageQueue, QueueInfo,
};
use kernel::KernelError;

use crate::database::RedisDatabase;
use crate::error::ConvertError;

#[derive(Debug)]
struct QueueData<T> {
    id: String,
    delivered_count: i64,
    info: QueueInfo<T>,
}

/// Redis stream backed work queue.
///
/// Entries stay pending until a worker acknowledges them. A delayed entry is
/// reclaimed by any worker once it has been idle for `retry_delay`; after
/// `max_retry` deliveries it is moved to the `failed:` hash.
pub struct RedisMessageQueue<M, T, H>
where
    M: 'static + Clone + Sync + Send,
    T: 'static + Clone + Serialize + for<'de> Deserialize<'de> + Sync + Send,
    H: Handler<M, T>,
{
    name: String,
    db: RedisDatabase,
    module: M,
    config: MQConfig,
    process: H,
    _data_type: PhantomData<T>,
}

impl<M, T, H> RedisMessageQueue<M, T, H>
where
    M: 'static + Clone + Sync + Send,
    T: 'static + Clone + Serialize + for<'de> Deserialize<'de> + Debug + Sync + Send,
    H: Handler<M, T>,
{
    pub fn with_handler(
        db: RedisDatabase,
        module: M,
        name: &str,
        config: MQConfig,
        process: H,
    ) -> Self {
        Self {
            name: name.to_string(),
            db,
            module,
            config,
            process,
            _data_type: PhantomData,
        }
    }

    #[tracing::instrument(skip(db, module, config, process))]
    async fn listen(db: RedisDatabase, name: String, module: M, config: MQConfig, process: H) {
        let member_name = format!("consumer:{}", Uuid::new_v4());
        let idle_millis = config.retry_delay().as_millis() as u64;
        loop {
            let QueueData {
                id,
                delivered_count,
                info,
            } = {
                let mut con = match db.transact().await {
                    Ok(con) => con,
                    Err(report) => {
                        error!("{report:?}");
                        sleep(Duration::from_secs(1)).await;
                        continue;
                    }
                };
                let mut result = RedisMqInternal::pop_pending::<T>(
                    &mut con,
                    &name,
                    &member_name,
                    idle_millis,
                )
                .await;
                if result.is_err() || result.as_ref().is_ok_and(Option::is_none) {
                    result = RedisMqInternal::pop_to_process(&mut con, &name, &member_name).await;
                }
                match result {
                    Ok(Some(data)) => data,
                    Ok(None) => continue,
                    Err(report) => {
                        error!("{report:?}");
                        sleep(Duration::from_secs(1)).await;
                        continue;
                    }
                }
            };
            debug!("Processing Id: {id}, TryCount: {delivered_count}");
            let DestructQueueInfo { id: uuid, data } = info.into_destruct();
            let result = process.clone().call(module.clone(), data.clone()).await;

            let mut con = match db.transact().await {
                Ok(con) => con,
                Err(report) => {
                    error!("{report:?}");
                    continue;
                }
            };
            if let Err(report) = result {
                let exhausted = delivered_count >= i64::from(*config.max_retry());
                match report.current_context() {
                    ErrorOperation::Delay if !exhausted => {
                        warn!("Delayed Id: {id}, TryCount: {delivered_count}, Report: {report:?}");
                        continue;
                    }
                    _ => {
                        let trace = format!("{report:?}");
                        if let Err(report) =
                            RedisMqInternal::push_failed_info(&mut con, &name, trace, uuid, data)
                                .await
                        {
                            error!("{report:?}");
                        }
                        error!("Failed Id: {id}, TryCount: {delivered_count}");
                    }
                }
            } else {
                debug!("Done Id: {id}, TryCount: {delivered_count}");
            }
            if let Err(report) = RedisMqInternal::mark_done(&mut con, &name, &id).await {
                error!("{report:?}");
            }
        }
    }
}

#[async_trait::async_trait]
impl<M, T, H> MessageQueue<M, T> for RedisMessageQueue<M, T, H>
where
    M: 'static + Clone + Sync + Send,
    T: 'static + Clone + Serialize + for<'de> Deserialize<'de> + Debug + Sync + Send,
    H: Handler<M, T>,
{
    type DatabaseConnection = RedisDatabase;
    type Handler = H;

    fn new(
        db: Self::DatabaseConnection,
        module: M,
        name: &str,
        config: MQConfig,
        process: H,
    ) -> Self {
        Self::with_handler(db, module, name, config, process)
    }

    fn start_workers(&self) {
        for _ in 0..*self.config.worker_count() {
            let db = self.db.clone();
            let name = self.name.clone();
            let module = self.module.clone();
            let config = self.config.clone();
            let process = self.process.clone();
            tokio::spawn(async move {
                Self::listen(db, name, module, config, process).await;
            });
        }
    }

    async fn queue(&self, info: &QueueInfo<T>) -> error_stack::Result<(), KernelError> {
        let mut con = self.db.transact().await?;
        RedisMqInternal::insert_waiting(&mut con, &self.name, info).await
    }

    async fn get_queued_len(&self) -> error_stack::Result<usize, KernelError> {
        let mut con = self.db.transact().await?;
        RedisMqInternal::get_wait_len(&mut con, &self.name)
            .await
            .and_then(|size| usize::try_from(size).change_context_lazy(|| KernelError::Internal))
    }

    async fn get_failed_infos(
        &self,
        size: &i64,
        offset: &i64,
    ) -> error_stack::Result<Vec<ErroredInfo<T>>, KernelError> {
        let mut con = self.db.transact().await?;
        RedisMqInternal::get_failed_info(&mut con, &self.name, size, offset).await
    }

    async fn get_failed_len(&self) -> error_stack::Result<usize, KernelError> {
        let mut con = self.db.transact().await?;
        RedisMqInternal::get_failed_len(&mut con, &self.name)
            .await
            .and_then(|size| usize::try_from(size).change_context_lazy(|| KernelError::Internal))
    }
}

const QUEUE_FIELD: &str = "info";

fn group(name: &str) -> String {
    format!("g:{name}")
}

fn failed(name: &str) -> String {
    format!("failed:{name}")
}

fn parse_error(value: impl Debug) -> Report<KernelError> {
    Report::new(KernelError::Internal)
        .attach_printable(format!("Failed to parse received data. {value:?}"))
}

pub(in crate::database) struct RedisMqInternal;

impl RedisMqInternal {
    async fn create_group(con: &mut Connection, name: &str) -> RedisResult<Value> {
        con.xgroup_create_mkstream(name, &group(name), 0).await
    }

    async fn insert_waiting<T: Serialize>(
        con: &mut Connection,
        name: &str,
        info: &QueueInfo<T>,
    ) -> error_stack::Result<(), KernelError> {
        // BUSYGROUP once the group exists
        let _ = Self::create_group(con, name).await;
        let serialize = serde_json::to_string(info).convert_error()?;
        con.xadd(name, "*", &[(QUEUE_FIELD, &serialize)])
            .await
            .convert_error()
    }

    async fn pop_to_process<T>(
        con: &mut Connection,
        name: &str,
        member: &str,
    ) -> error_stack::Result<Option<QueueData<T>>, KernelError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let options = StreamReadOptions::default()
            .block(1000)
            .count(1)
            .group(group(name), member);
        let result: Value = con
            .xread_options(&[name], &[">"], &options)
            .await
            .convert_error()?;
        let bulk = match result {
            Value::Bulk(bulk) => bulk,
            Value::Nil => return Ok(None),
            _ => return Err(parse_error(result)),
        };
        let bulk = match bulk.as_slice() {
            [Value::Bulk(bulk)] => bulk,
            _ => return Err(parse_error(bulk)),
        };
        let bulk = match bulk.as_slice() {
            [Value::Data(_name), Value::Bulk(bulk)] => bulk,
            _ => return Err(parse_error(bulk)),
        };
        let bulk = match bulk.as_slice() {
            [Value::Bulk(bulk)] => bulk,
            _ => return Err(parse_error(bulk)),
        };
        let (id, bulk) = match bulk.as_slice() {
            [Value::Data(id), Value::Bulk(bulk)] => (id, bulk),
            _ => return Err(parse_error(bulk)),
        };
        let data = match bulk.as_slice() {
            [Value::Data(_field), Value::Data(data)] => data,
            _ => return Err(parse_error(bulk)),
        };
        Ok(Some(QueueData {
            id: from_utf8(id)
                .change_context_lazy(|| KernelError::Internal)?
                .to_string(),
            delivered_count: 1,
            info: serde_json::from_slice(data).convert_error()?,
        }))
    }

    async fn mark_done(
        con: &mut Connection,
        name: &str,
        id: &str,
    ) -> error_stack::Result<(), KernelError> {
        con.xack::<_, _, _, ()>(name, &group(name), &[id]).await.convert_error()?;
        con.xdel(name, &[id]).await.convert_error()
    }

    /// Claims the oldest entry idle for at least `idle_millis`.
    ///
    /// The returned delivery count includes this claim.
    async fn pop_pending<T>(
        con: &mut Connection,
        name: &str,
        own_member: &str,
        idle_millis: u64,
    ) -> error_stack::Result<Option<QueueData<T>>, KernelError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let _ = Self::create_group(con, name).await;
        let group = group(name);
        let value: Value = redis::cmd("XPENDING")
            .arg(name)
            .arg(&group)
            .arg("IDLE")
            .arg(idle_millis)
            .arg("-")
            .arg("+")
            .arg(1) // count
            .query_async(con)
            .await
            .convert_error()?;

        let bulk = match value {
            Value::Bulk(bulk) => bulk,
            _ => return Err(parse_error(value)),
        };
        if bulk.is_empty() {
            return Ok(None);
        }
        let bulk = match bulk.as_slice() {
            [Value::Bulk(bulk)] => bulk,
            _ => return Err(parse_error(bulk)),
        };
        let (id, count) = match bulk.as_slice() {
            [Value::Data(id), Value::Data(_original_owner), _idle, Value::Int(count)] => (
                from_utf8(id)
                    .change_context_lazy(|| KernelError::Internal)?
                    .to_string(),
                *count,
            ),
            _ => return Err(parse_error(bulk)),
        };

        let result: Value = con
            .xclaim(name, &group, own_member, idle_millis, &[&id])
            .await
            .convert_error()?;

        let bulk = match result {
            Value::Bulk(bulk) => bulk,
            _ => return Err(parse_error(result)),
        };
        let bulk = match bulk.as_slice() {
            [Value::Bulk(bulk)] => bulk,
            // Trimmed while pending; drop the dangling reference.
            [] | [Value::Nil] => {
                Self::mark_done(con, name, &id).await?;
                return Ok(None);
            }
            _ => return Err(parse_error(bulk)),
        };
        let bulk = match bulk.as_slice() {
            [Value::Data(_id), Value::Bulk(bulk)] => bulk,
            _ => return Err(parse_error(bulk)),
        };
        match bulk.as_slice() {
            [Value::Data(_field), Value::Data(data)] => Ok(Some(QueueData {
                id,
                delivered_count: count + 1,
                info: serde_json::from_slice(data).convert_error()?,
            })),
            _ => Err(parse_error(bulk)),
        }
    }

    async fn push_failed_info<T: Serialize>(
        con: &mut Connection,
        name: &str,
        stack_trace: String,
        uuid: Uuid,
        data: T,
    ) -> error_stack::Result<(), KernelError> {
        let raw_uuid = uuid.to_string();
        let info = ErroredInfo::new(uuid, data, stack_trace);
        let raw = serde_json::to_string(&info).convert_error()?;
        con.hset(&failed(name), &raw_uuid, &raw)
            .await
            .convert_error()
    }

    async fn get_failed_info<T: for<'de> Deserialize<'de>>(
        con: &mut Connection,
        name: &str,
        size: &i64,
        offset: &i64,
    ) -> error_stack::Result<Vec<ErroredInfo<T>>, KernelError> {
        if *size <= 0 {
            return Ok(vec![]);
        }
        let result: Value = redis::cmd("HSCAN")
            .arg(failed(name))
            .arg(offset)
            .arg("COUNT")
            .arg(size)
            .query_async(con)
            .await
            .convert_error()?;
        let bulk = match result {
            Value::Bulk(bulk) => bulk,
            _ => return Err(parse_error(result)),
        };
        let bulk = match bulk.as_slice() {
            [Value::Data(_cursor), Value::Bulk(bulk)] => bulk,
            _ => return Err(parse_error(bulk)),
        };
        let take = usize::try_from(*size).change_context_lazy(|| KernelError::Internal)?;
        // HSCAN may return more than size
        bulk.chunks(2)
            .take(take)
            .map(|pair| match pair {
                [Value::Data(_id), Value::Data(data)] => serde_json::from_slice(data).convert_error(),
                _ => Err(parse_error(pair)),
            })
            .collect()
    }

    async fn get_failed_len(
        con: &mut Connection,
        name: &str,
    ) -> error_stack::Result<i64, KernelError> {
        let failed = failed(name);
        let result: Value = con.hlen(&failed).await.convert_error()?;
        match result {
            Value::Int(size) => Ok(size),
            _ => Err(Report::new(KernelError::Internal)
                .attach_printable(format!("Failed to get size. target: {failed}"))),
        }
    }

    async fn get_wait_len(
        con: &mut Connection,
        name: &str,
    ) -> error_stack::Result<i64, KernelError> {
        let result: Value = con.xlen(name).await.convert_error()?;
        match result {
            Value::Int(size) => Ok(size),
            _ => Err(Report::new(KernelError::Internal)
                .attach_printable(format!("Failed to get size. target: {name}"))),
        }
    }
}
