pub mod soundstretch_pitch_shifter;
pub mod wav_audio_reader;
pub mod wav_audio_writer;
pub mod whisper_recognizer;
