pub mod alignment {
    pub mod domain {
        pub mod discrepancy;
        pub mod edit_script;
        pub mod sequence_aligner;
        pub mod tokenization;
    }
}

pub mod audio {
    pub mod domain {
        pub mod audio_reader;
        pub mod audio_segment;
        pub mod audio_writer;
        pub mod pitch_shifter;
        pub mod speech_recognizer;
    }
    pub mod infrastructure;
}

pub mod feedback {
    pub mod domain {
        pub mod audio_port;
        pub mod delay_line;
        pub mod frame_scheduler;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod pipeline_logger;
    pub mod practice_session;
}

pub mod shared {
    pub mod constants;
    pub mod frame;
    pub mod model_resolver;
    pub mod settings;
}
