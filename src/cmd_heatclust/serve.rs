use clap::*;
use crossbeam::channel;
use heatclust::libs::worker::{self, ClusterWorker, Response};
use std::io::{BufRead, Write};
use std::thread;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("serve")
        .about("JSON-lines worker, one request in flight")
        .after_help(
            r###"
Reads one JSON request per line and writes one JSON response per line.

Request:
    {"kind":"cluster","nrows":2,"ncols":2,"values":[1,2,3,null],
     "axis":"Both","linkage":"Average","distance":"Euclidean",
     "scaling":"none","leafOrder":"minindex"}

Only `kind`, `nrows`, `ncols` and `values` are required. Missing cells are
`null`.

Responses:
    {"kind":"result","rowOrder":[..],"colOrder":[..],"values":[..]}
    {"kind":"error","message":".."}

A new request replaces the one in flight, whose response is never written.
With `--all` every request is answered; results keep input order, but an
error for a malformed line is written as soon as the line is read.

Examples:
1. Answer a batch of requests:
   heatclust serve requests.jsonl --all

2. Act as a worker behind a pipe:
   heatclust serve stdin

"###,
        )
        .arg(
            Arg::new("infile")
                .num_args(1)
                .index(1)
                .default_value("stdin")
                .help("Request stream. [stdin] for standard input"),
        )
        .arg(
            Arg::new("all")
                .long("all")
                .action(ArgAction::SetTrue)
                .help("Answer every request instead of only the latest"),
        )
        .arg(super::arg_outfile())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let infile = args.get_one::<String>("infile").unwrap().to_string();
    let is_all = args.get_flag("all");

    let mut writer = intspan::writer(args.get_one::<String>("outfile").unwrap());

    //----------------------------
    // Ops
    //----------------------------
    let (line_tx, line_rx) = channel::unbounded::<String>();
    let reader_handle = thread::spawn(move || -> std::io::Result<()> {
        let reader = intspan::reader(&infile);
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if line_tx.send(line).is_err() {
                break;
            }
        }
        Ok(())
    });

    let mut worker = ClusterWorker::new();
    loop {
        let response_rx = worker.receiver().cloned().unwrap_or_else(channel::never);

        let event = channel::select! {
            recv(line_rx) -> line => Event::Line(line.ok()),
            recv(response_rx) -> response => Event::Done(response),
        };

        match event {
            // input exhausted
            Event::Line(None) => break,
            Event::Line(Some(line)) => match worker::parse_request(&line) {
                Ok(request) => {
                    if is_all {
                        if let Some(response) = worker.wait() {
                            emit(&mut writer, &response)?;
                        }
                    }
                    let generation = worker.submit(request);
                    log::info!("request #{} submitted", generation);
                }
                Err(err) => {
                    log::warn!("{}", err);
                    emit(&mut writer, &Response::error(err))?;
                }
            },
            Event::Done(received) => {
                let response = worker.complete(received);
                emit(&mut writer, &response)?;
            }
        }
    }

    if let Some(response) = worker.wait() {
        emit(&mut writer, &response)?;
    }

    match reader_handle.join() {
        Ok(result) => result?,
        Err(_) => anyhow::bail!("request reader panicked"),
    }

    Ok(())
}

enum Event {
    Line(Option<String>),
    Done(Result<Response, channel::RecvError>),
}

fn emit<W: Write + ?Sized>(writer: &mut W, response: &Response) -> anyhow::Result<()> {
    writer.write_fmt(format_args!("{}\n", serde_json::to_string(response)?))?;
    writer.flush()?;
    Ok(())
}
