use taskrunner_core::CommandValidator;

pub fn run(command: &str) -> anyhow::Result<()> {
    CommandValidator::new()
        .validate(command)
        .map_err(taskrunner_core::ExecutorError::from)?;
    println!("Command accepted.");
    Ok(())
}
