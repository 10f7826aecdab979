use std::path::PathBuf;
use std::time::Duration;

use dropship::error::DeployError;

#[test]
fn display_command_not_found() {
    let err = DeployError::CommandNotFound("git".into());
    assert_eq!(err.to_string(), "command not found: git");
}

#[test]
fn display_ssh_failed() {
    let err = DeployError::SshFailed("deploy@10.0.0.5: Connection refused".into());
    assert_eq!(
        err.to_string(),
        "SSH connection failed: deploy@10.0.0.5: Connection refused"
    );
}

#[test]
fn display_prerequisite_missing() {
    let err = DeployError::PrerequisiteMissing("`tar` not found on PATH".into());
    assert_eq!(err.to_string(), "prerequisite missing: `tar` not found on PATH");
}

#[test]
fn display_missing_key() {
    let err = DeployError::MissingKey(PathBuf::from("/home/op/.ssh/nope"));
    assert_eq!(err.to_string(), "SSH key not found: /home/op/.ssh/nope");
}

#[test]
fn display_no_descriptor() {
    let err = DeployError::NoDescriptor(PathBuf::from("shop"));
    assert_eq!(
        err.to_string(),
        "no Dockerfile or docker-compose file found in shop"
    );
}

#[test]
fn display_remote_failed_with_stderr() {
    let err = DeployError::RemoteFailed {
        command: "sudo systemctl reload nginx".into(),
        code: Some(1),
        stderr: "Job for nginx.service failed".into(),
    };
    assert_eq!(
        err.to_string(),
        "remote command failed (exit 1): sudo systemctl reload nginx: Job for nginx.service failed"
    );
}

#[test]
fn display_remote_failed_killed() {
    let err = DeployError::RemoteFailed {
        command: "bash -s --".into(),
        code: None,
        stderr: String::new(),
    };
    assert_eq!(err.to_string(), "remote command failed (killed): bash -s --");
}

#[test]
fn display_timeout() {
    let err = DeployError::Timeout {
        command: "ssh deploy@host bash -s --".into(),
        after: Duration::from_secs(1800),
    };
    assert_eq!(
        err.to_string(),
        "command timed out after 1800s: ssh deploy@host bash -s --"
    );
}

#[test]
fn display_other() {
    let err = DeployError::Other("custom error".into());
    assert_eq!(err.to_string(), "custom error");
}

#[test]
fn exit_codes() {
    assert_eq!(DeployError::MissingKey(PathBuf::from("k")).exit_code(), 1);
    assert_eq!(DeployError::SshFailed("x".into()).exit_code(), 2);
    assert_eq!(DeployError::EmptyPort.exit_code(), 3);
    assert_eq!(DeployError::NoDescriptor(PathBuf::from(".")).exit_code(), 21);
}

#[test]
fn everything_else_is_99() {
    let errors = [
        DeployError::InvalidParameter("port".into()),
        DeployError::ProxyValidation("unexpected }".into()),
        DeployError::PrerequisiteMissing("git".into()),
        DeployError::CommandNotFound("ssh".into()),
        DeployError::Other("boom".into()),
        DeployError::Timeout {
            command: "ssh".into(),
            after: Duration::from_secs(1),
        },
    ];
    for err in errors {
        assert_eq!(err.exit_code(), 99, "{err}");
    }
}

#[test]
fn from_io_error() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err: DeployError = io_err.into();
    assert!(matches!(err, DeployError::Io(_)));
    assert_eq!(err.exit_code(), 99);
}

#[test]
fn from_json_error() {
    let json_err = serde_json::from_str::<Vec<u64>>("invalid").unwrap_err();
    let err: DeployError = json_err.into();
    assert!(matches!(err, DeployError::Json(_)));
}

#[test]
fn cancelled_prompt_is_99() {
    let err: DeployError = inquire::InquireError::OperationCanceled.into();
    assert!(matches!(err, DeployError::Prompt(_)));
    assert!(err.to_string().starts_with("prompt failed: "));
    assert_eq!(err.exit_code(), 99);
}
