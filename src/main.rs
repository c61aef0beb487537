use std::env;

use rdb_restore::task::task_runner::TaskRunner;

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        panic!("no task_config provided in args");
    }

    let task_config = args[1].clone();
    let runner = TaskRunner::new(&task_config).unwrap();
    runner.start_task(true).await.unwrap()
}
