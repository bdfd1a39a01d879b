// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Speech output capability
//!
//! The conversation reads settled replies aloud through whatever
//! [`SpeechOutput`] it was given. When none is configured nothing happens.

use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};

/// Something that can read text aloud
pub trait SpeechOutput: Send + Sync {
    /// Start speaking `text`. Failures are the implementation's to log.
    fn speak(&self, text: &str);
}

/// Speaks by running an external program with the text as its argument.
///
/// Only one utterance plays at a time: starting a new one kills and reaps
/// the previous process. The last process is reaped on drop.
#[derive(Debug)]
pub struct CommandSpeech {
    program: String,
    current: Mutex<Option<Child>>,
}

impl CommandSpeech {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            current: Mutex::new(None),
        }
    }

    /// Process id of the utterance still playing, if any
    pub fn speaking_pid(&self) -> Option<u32> {
        let mut current = self.lock();
        let finished = match current.as_mut() {
            Some(child) => !matches!(child.try_wait(), Ok(None)),
            None => return None,
        };
        if finished {
            *current = None;
            return None;
        }
        current.as_ref().map(Child::id)
    }

    /// Wait for the utterance in progress to finish
    pub fn finish(&self) {
        if let Some(mut child) = self.lock().take() {
            if let Err(e) = child.wait() {
                tracing::warn!("Could not wait for speech process {}: {}", child.id(), e);
            }
        }
    }

    /// Stop the utterance in progress
    pub fn cancel(&self) {
        if let Some(child) = self.lock().take() {
            stop(child);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Child>> {
        match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Speech process lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

fn stop(mut child: Child) {
    if let Err(e) = child.kill() {
        tracing::debug!("Speech process {} already exited: {}", child.id(), e);
    }
    if let Err(e) = child.wait() {
        tracing::warn!("Could not reap speech process {}: {}", child.id(), e);
    }
}

impl SpeechOutput for CommandSpeech {
    fn speak(&self, text: &str) {
        let mut current = self.lock();
        if let Some(previous) = current.take() {
            stop(previous);
        }

        match Command::new(&self.program)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => *current = Some(child),
            Err(e) => tracing::warn!("Speech command '{}' failed: {}", self.program, e),
        }
    }
}

impl Drop for CommandSpeech {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Collects spoken text instead of playing it
#[derive(Debug, Clone, Default)]
pub struct RecordingSpeech {
    spoken: Arc<Mutex<Vec<String>>>,
}

impl RecordingSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything spoken so far, in order
    pub fn spoken(&self) -> Vec<String> {
        match self.spoken.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl SpeechOutput for RecordingSpeech {
    fn speak(&self, text: &str) {
        match self.spoken.lock() {
            Ok(mut guard) => guard.push(text.to_string()),
            Err(poisoned) => {
                tracing::warn!("Speech recorder lock was poisoned, recovering");
                poisoned.into_inner().push(text.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_speech_keeps_order() {
        let speech = RecordingSpeech::new();
        let shared: Arc<dyn SpeechOutput> = Arc::new(speech.clone());
        shared.speak("one");
        shared.speak("two");
        assert_eq!(speech.spoken(), vec!["one", "two"]);
    }

    #[test]
    fn test_missing_program_does_not_panic() {
        let speech = CommandSpeech::new("studychat-no-such-speech-program");
        speech.speak("hello");
        assert!(speech.speaking_pid().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_finish_waits_for_utterance() {
        let speech = CommandSpeech::new("true");
        speech.speak("done");
        speech.finish();
        assert!(speech.speaking_pid().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_new_utterance_replaces_previous() {
        // `sleep` stands in for a speech program that is still talking.
        let speech = CommandSpeech::new("sleep");
        speech.speak("30");
        let first = speech.speaking_pid().expect("first utterance running");

        speech.speak("30");
        let second = speech.speaking_pid().expect("second utterance running");
        assert_ne!(first, second);

        // The first process was killed and reaped, so no zombie is left behind.
        assert!(!std::path::Path::new(&format!("/proc/{}", first)).exists());

        speech.cancel();
        assert!(speech.speaking_pid().is_none());
        assert!(!std::path::Path::new(&format!("/proc/{}", second)).exists());
    }
}
