use assert_cmd::Command;
use heatclust::libs::worker::Response;

#[test]
fn command_serve_one() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("heatclust")?;
    let output = cmd
        .arg("serve")
        .write_stdin(
            r#"{"kind":"cluster","nrows":4,"ncols":3,"values":[1,2,3,2,3,4,8,8,8,0,0,0]}"#,
        )
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(stdout.lines().count(), 1);
    assert!(stdout.contains("\"kind\":\"result\""));
    assert!(stdout.contains("\"rowOrder\":[0,1,3,2]"));
    assert!(stdout.contains("\"colOrder\":[0,1,2]"));

    Ok(())
}

#[test]
fn command_serve_all() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("heatclust")?;
    let output = cmd
        .arg("serve")
        .arg("tests/heatmap/requests.jsonl")
        .arg("--all")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;
    let lines: Vec<&str> = stdout.lines().collect();

    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines.iter().filter(|l| l.contains("\"kind\":\"error\"")).count(),
        2
    );
    assert!(stdout.contains("malformed request"));
    assert!(stdout.contains("matrix shape 2x2 does not match 3 values"));
    assert!(stdout.contains("\"rowOrder\":[0,1,3,2]"));
    assert!(stdout.contains("\"colOrder\":[0,2,1]"));
    assert!(stdout.contains("\"values\":[1.0,null,3.0]"));

    Ok(())
}

#[test]
fn command_serve_latest_wins() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("heatclust")?;
    let output = cmd
        .arg("serve")
        .write_stdin(concat!(
            r#"{"kind":"cluster","nrows":4,"ncols":3,"values":[1,2,3,2,3,4,8,8,8,0,0,0]}"#,
            "\n",
            r#"{"kind":"cluster","nrows":1,"ncols":3,"values":[1,null,3],"axis":"Column"}"#,
            "\n",
        ))
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;
    let lines: Vec<&str> = stdout.lines().collect();

    // the first answer may be dropped, the last never is
    assert!(!lines.is_empty() && lines.len() <= 2);
    assert!(lines[lines.len() - 1].contains("\"colOrder\":[0,2,1]"));

    Ok(())
}

#[test]
fn command_serve_decode() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("heatclust")?;
    let output = cmd
        .arg("serve")
        .write_stdin(
            r#"{"kind":"cluster","nrows":2,"ncols":3,"values":[0,5,0.1,0,5,0.2],"axis":"Both","scaling":"row"}"#,
        )
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    let response: Response = serde_json::from_str(stdout.trim())?;
    let Response::Result(result) = response else {
        anyhow::bail!("expected a result, got {}", stdout);
    };
    assert_eq!(result.row_order, vec![0, 1]);
    assert_eq!(result.col_order, vec![0, 2, 1]);
    assert_eq!(result.values.len(), 6);
    assert_eq!(result.values[1], 1.0);

    Ok(())
}
