//! A small CLI for exercising a `sharq` deployment by hand, grounded in
//! `ergo`'s own `erq` binary (`api/cmd/erq.rs`): one subcommand per core
//! operation, a `SharQ` built straight from `Settings::load()`. Not meant
//! for production traffic -- there is no batching, retries, or backoff.

use structopt::StructOpt;

use sharq::job::JobId;
use sharq::{Error, RedisPool, Settings, SharQ, DEFAULT_QUEUE_TYPE};

#[derive(Debug, StructOpt)]
#[structopt(name = "sharqctl", about = "Inspect and drive a sharq queue")]
struct Args {
    #[structopt(
        short,
        long,
        help = "Queue type to operate on (omit for global metrics)"
    )]
    queue_type: Option<String>,

    #[structopt(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, StructOpt)]
enum Cmd {
    #[structopt(about = "Enqueue a job")]
    Enqueue {
        queue_id: String,
        #[structopt(help = "Raw payload bytes, taken as a UTF-8 string")]
        payload: String,
        #[structopt(long, default_value = "1000", help = "Rate-limit interval, in ms")]
        interval_ms: i64,
        #[structopt(long, help = "Use this job id instead of generating one")]
        job_id: Option<String>,
    },
    #[structopt(about = "Dequeue the next ready job")]
    Dequeue,
    #[structopt(about = "Mark a job finished")]
    Finish { queue_id: String, job_id: String },
    #[structopt(about = "Change a tenant's rate-limit interval")]
    Interval { queue_id: String, interval_ms: i64 },
    #[structopt(about = "Requeue all expired in-flight jobs across every type")]
    Requeue,
    #[structopt(about = "Show metrics")]
    Metrics {
        #[structopt(help = "Tenant to report on; requires --queue-type")]
        queue_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let args = Args::from_args();
    let settings = Settings::load()?;
    let pool = RedisPool::new(Some(settings.redis_url.clone()))?;
    let queue = SharQ::new(pool, settings);
    let queue_type = args.queue_type.as_deref().unwrap_or(DEFAULT_QUEUE_TYPE);

    match args.cmd {
        Cmd::Enqueue {
            queue_id,
            payload,
            interval_ms,
            job_id,
        } => {
            let job_id = match job_id.as_deref() {
                Some(id) => JobId::Value(id),
                None => JobId::Auto,
            };
            let id = queue
                .enqueue(queue_type, &queue_id, job_id, payload.as_bytes(), interval_ms)
                .await?;
            println!("queued job {}", id);
        }
        Cmd::Dequeue => match queue.dequeue(queue_type).await? {
            Some(job) => println!(
                "queue_id={} job_id={} payload={}",
                job.queue_id,
                job.job_id,
                String::from_utf8_lossy(&job.payload)
            ),
            None => println!("no ready work"),
        },
        Cmd::Finish { queue_id, job_id } => {
            let ok = queue.finish(queue_type, &queue_id, &job_id).await?;
            println!("{}", if ok { "finished" } else { "not active" });
        }
        Cmd::Interval {
            queue_id,
            interval_ms,
        } => {
            let ok = queue.interval(queue_type, &queue_id, interval_ms).await?;
            println!("{}", if ok { "updated" } else { "unknown tenant" });
        }
        Cmd::Requeue => {
            let count = queue.requeue().await?;
            println!("requeued {} job(s)", count);
        }
        Cmd::Metrics { queue_id } => {
            SharQ::validate_metrics_selector(args.queue_type.as_deref(), queue_id.as_deref())?;
            match (args.queue_type.as_deref(), queue_id) {
                (None, None) => {
                    let m = queue.metrics_global().await?;
                    println!("{:#?}", m);
                }
                (Some(queue_type), None) => {
                    let m = queue.metrics_by_type(queue_type).await?;
                    println!("{:#?}", m);
                }
                (Some(queue_type), Some(queue_id)) => {
                    let m = queue.metrics_by_tenant(queue_type, &queue_id).await?;
                    println!("{:#?}", m);
                }
                (None, Some(_)) => unreachable!("rejected by validate_metrics_selector above"),
            }
        }
    }

    Ok(())
}
