pub mod cpal_audio_device;
